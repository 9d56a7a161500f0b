// ABOUTME: SeaORM entities module for database models and relationships
// ABOUTME: Exports reference types, principals, managed targets and their link tables

pub mod connection_login;
pub mod connection_type;
pub mod database;
pub mod database_type;
pub mod function_permission;
pub mod function_type;
pub mod group;
pub mod login;
pub mod server;
pub mod server_permission;
pub mod server_type;
pub mod user;
pub mod user_group;

pub use connection_login::Entity as ConnectionLogin;
pub use connection_type::Entity as ConnectionType;
pub use database::Entity as Database;
pub use database_type::Entity as DatabaseType;
pub use function_permission::Entity as FunctionPermission;
pub use function_type::Entity as FunctionType;
pub use group::Entity as Group;
pub use login::Entity as Login;
pub use server::Entity as Server;
pub use server_permission::Entity as ServerPermission;
pub use server_type::Entity as ServerType;
pub use user::Entity as User;
pub use user_group::Entity as UserGroup;
