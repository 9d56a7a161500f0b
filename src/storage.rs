// ABOUTME: Generic entity store: one CRUD implementation shared by every table descriptor
// ABOUTME: Each mutation validates, writes and reads back inside a single transaction

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectionTrait, Database,
    DatabaseConnection, EntityTrait, FromQueryResult, IntoActiveModel, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::auth::Function;
use crate::crypto::CredentialCodec;
use crate::error::{AppError, Result};
use crate::migration::Migrator;
use crate::schema::Schema;
use crate::validation;

/// Functions a principal needs before mutating a resource.
#[derive(Copy, Clone, Debug)]
pub struct Guard {
    pub create: Function,
    pub modify: Function,
    pub delete: Function,
}

/// A table the store can list, fetch and delete rows from.
pub trait Resource: Send + Sync + 'static {
    type Entity: EntityTrait<Model = Self::Model>;
    type Model: ModelTrait<Entity = Self::Entity>
        + FromQueryResult
        + IntoActiveModel<Self::ActiveModel>
        + Serialize
        + Send
        + Sync
        + 'static;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity>
        + ActiveModelBehavior
        + Send
        + 'static;

    const SCHEMA: &'static Schema;
    const ID: <Self::Entity as EntityTrait>::Column;
    const GUARD: Guard;
    /// Function needed to read rows whose rendering reveals secrets.
    const READ: Option<Function> = None;

    fn id(model: &Self::Model) -> i32;

    fn to_json(model: &Self::Model, _codec: &CredentialCodec) -> Result<Value> {
        Ok(serde_json::to_value(model)?)
    }
}

/// A resource created directly from a request payload.
pub trait Creatable: Resource {
    type Input: DeserializeOwned + Send;

    /// Column backing `SCHEMA.unique`.
    const UNIQUE: Option<<Self::Entity as EntityTrait>::Column> = None;

    fn validate(_input: &Self::Input) -> Result<()> {
        Ok(())
    }

    fn new_row(input: Self::Input, codec: &CredentialCodec) -> Result<Self::ActiveModel>;
}

/// A resource whose descriptive fields may change after creation.
pub trait Mutable: Creatable {
    type Changes: DeserializeOwned + Send;

    /// Runs before the uniqueness check, mirroring `Creatable::validate`.
    fn validate_changes(_current: &Self::Model, _changes: &Self::Changes) -> Result<()> {
        Ok(())
    }

    fn apply_changes(
        current: Self::Model,
        changes: Self::Changes,
        codec: &CredentialCodec,
    ) -> Result<Self::ActiveModel>;
}

pub struct Storage {
    pub db: DatabaseConnection,
    pub codec: CredentialCodec,
}

impl Storage {
    /// Connects to `database_url` and brings the schema up to date.
    pub async fn connect(database_url: &str, codec: CredentialCodec) -> anyhow::Result<Self> {
        let db = Database::connect(database_url).await?;
        Migrator::up(&db, None).await?;

        Ok(Self { db, codec })
    }

    pub async fn list_all<R: Resource>(&self) -> Result<Vec<R::Model>> {
        let rows = R::Entity::find()
            .order_by_asc(R::ID)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    pub async fn count<R: Resource>(&self) -> Result<u64> {
        Ok(R::Entity::find().count(&self.db).await?)
    }

    pub async fn get_by_id<R: Resource>(&self, id: i32) -> Result<R::Model> {
        find::<R, _>(&self.db, id)
            .await?
            .ok_or_else(|| not_found::<R>(id))
    }

    pub async fn create<R: Creatable>(&self, payload: Value) -> Result<R::Model> {
        validation::check_required_fields(&payload, R::SCHEMA)?;
        validation::check_field_kinds(&payload, R::SCHEMA)?;
        let input: R::Input = serde_json::from_value(payload.clone())?;
        R::validate(&input)?;

        let txn = self.db.begin().await?;
        validation::check_foreign_keys(&txn, &payload, R::SCHEMA).await?;
        ensure_unique::<R, _>(&txn, &payload, None).await?;

        let row = R::new_row(input, &self.codec)?;
        let inserted = row
            .insert(&txn)
            .await
            .map_err(|err| AppError::from_write(err, R::SCHEMA.table.label(), false))?;
        let stored = read_back::<R, _>(&txn, R::id(&inserted)).await?;
        txn.commit().await?;

        debug!(operation = "create", table = R::SCHEMA.table.name(), id = R::id(&stored));
        Ok(stored)
    }

    pub async fn update<R: Mutable>(&self, id: i32, payload: Value) -> Result<R::Model> {
        validation::check_mutable_fields(&payload, R::SCHEMA)?;
        validation::check_field_kinds(&payload, R::SCHEMA)?;
        let touches_field = validation::as_object(&payload)?
            .iter()
            .any(|(key, value)| !value.is_null() && R::SCHEMA.field(key).is_some());
        if !touches_field {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }
        let changes: R::Changes = serde_json::from_value(payload.clone())?;

        let txn = self.db.begin().await?;
        let current = find::<R, _>(&txn, id)
            .await?
            .ok_or_else(|| not_found::<R>(id))?;
        R::validate_changes(&current, &changes)?;
        ensure_unique::<R, _>(&txn, &payload, Some(id)).await?;

        let row = R::apply_changes(current, changes, &self.codec)?;
        row.update(&txn)
            .await
            .map_err(|err| AppError::from_write(err, R::SCHEMA.table.label(), false))?;
        let stored = read_back::<R, _>(&txn, id).await?;
        txn.commit().await?;

        debug!(operation = "update", table = R::SCHEMA.table.name(), id);
        Ok(stored)
    }

    /// Hard delete. Link rows pointing at the deleted row are left in place.
    pub async fn delete<R: Resource>(&self, id: i32) -> Result<()> {
        let txn = self.db.begin().await?;
        let result = R::Entity::delete_many()
            .filter(R::ID.eq(id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(not_found::<R>(id));
        }
        txn.commit().await?;

        debug!(operation = "delete", table = R::SCHEMA.table.name(), id);
        Ok(())
    }
}

pub(crate) async fn find<R: Resource, C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<R::Model>> {
    let row = R::Entity::find().filter(R::ID.eq(id)).one(db).await?;
    Ok(row)
}

pub(crate) async fn read_back<R: Resource, C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<R::Model> {
    find::<R, _>(db, id).await?.ok_or_else(|| {
        AppError::Internal(format!(
            "{} {} vanished before commit",
            R::SCHEMA.table.label(),
            id
        ))
    })
}

pub(crate) fn not_found<R: Resource>(id: i32) -> AppError {
    AppError::NotFound(format!("{} {}", R::SCHEMA.table.label(), id))
}

/// Friendly duplicate check; the unique index still arbitrates concurrent writers.
async fn ensure_unique<R: Creatable, C: ConnectionTrait>(
    db: &C,
    payload: &Value,
    exclude: Option<i32>,
) -> Result<()> {
    let (Some(field), Some(column)) = (R::SCHEMA.unique, R::UNIQUE) else {
        return Ok(());
    };
    let Some(value) = payload.get(field).and_then(Value::as_str) else {
        return Ok(());
    };

    let mut query = R::Entity::find().filter(column.eq(value));
    if let Some(id) = exclude {
        query = query.filter(R::ID.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(AppError::DuplicateKey(format!(
            "{}: {}",
            R::SCHEMA.table.label(),
            value
        )));
    }
    Ok(())
}
