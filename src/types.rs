// ABOUTME: Type definitions for API request payloads and response bodies
// ABOUTME: Create payloads carry every required field; change payloads only the mutable ones

use serde::{Deserialize, Serialize};

use crate::entities::group;

// Create payloads
#[derive(Debug, Deserialize)]
pub struct TypeRecordInput {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct GroupInput {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ServerInput {
    pub description: String,
    pub host: String,
    pub port: i32,
    pub server_type_id: i32,
    pub connection_type_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseInput {
    pub description: String,
    pub host: String,
    pub port: i32,
    pub sid: String,
    pub database_type_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub user: String,
    pub password: String,
    pub connection_type_id: Option<i32>,
}

// Change payloads
#[derive(Debug, Default, Deserialize)]
pub struct GroupChanges {
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserChanges {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerChanges {
    pub description: Option<String>,
    pub host: Option<String>,
    pub port: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DatabaseChanges {
    pub description: Option<String>,
    pub host: Option<String>,
    pub port: Option<i32>,
    pub sid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginChanges {
    pub user: Option<String>,
    pub password: Option<String>,
}

// Responses
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginView {
    pub id: i32,
    pub user: String,
    pub password: String,
    pub connection_type_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AllowResponse {
    #[serde(rename = "Allow")]
    pub allow: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PrincipalResponse {
    pub id: i32,
    pub name: String,
    pub groups: Vec<group::Model>,
    pub functions: Vec<String>,
}
