use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, IdenStatic, IntoActiveModel, Iterable,
    PrimaryKeyToColumn, PrimaryKeyTrait, SqlErr,
};

use inkwell_core::error::RepoError;
use inkwell_core::ports::BaseRepository;

/// Generic PostgreSQL repository implementation.
pub struct PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub(crate) db: DbConn,
    _entity: PhantomData<E>,
}

impl<E> PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }
}

/// Map a SeaORM error, surfacing constraint violations as their own variants.
pub(crate) fn repo_err(err: DbErr) -> RepoError {
    if let Some(violation) = err.sql_err().and_then(violation_err) {
        return violation;
    }

    match err {
        DbErr::Conn(e) => RepoError::Connection(e.to_string()),
        other => RepoError::Query(other.to_string()),
    }
}

/// Unique violations are duplicates; foreign key violations point at a missing row.
pub(crate) fn violation_err(violation: SqlErr) -> Option<RepoError> {
    match violation {
        SqlErr::UniqueConstraintViolation(msg) => Some(RepoError::Constraint(msg)),
        SqlErr::ForeignKeyConstraintViolation(msg) => Some(RepoError::MissingReference {
            entity: "referenced row",
            key: msg,
        }),
        _ => None,
    }
}

/// `INSERT .. ON CONFLICT (pk) DO UPDATE` over every non-key column.
fn upsert_on_primary_key<E: EntityTrait>() -> OnConflict {
    let keys: Vec<E::Column> = E::PrimaryKey::iter().map(|pk| pk.into_column()).collect();
    let values = E::Column::iter().filter(|column| {
        !keys
            .iter()
            .any(|key| key.as_str() == column.as_str())
    });

    let mut on_conflict = OnConflict::columns(keys.clone());
    on_conflict.update_columns(values);
    on_conflict
}

#[async_trait]
impl<E, T, ID> BaseRepository<T, ID> for PostgresBaseRepository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync + Send,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send + Sync,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = ID>,
    E::Column: ColumnTrait,
    ID: Send + Sync + Into<sea_orm::Value> + Clone + Copy + 'static,
    T: From<E::Model> + Into<E::ActiveModel> + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError> {
        let result = E::find_by_id(id).one(&self.db).await.map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, entity: T) -> Result<T, RepoError> {
        let active_model: E::ActiveModel = entity.into();

        let model = E::insert(active_model)
            .on_conflict(upsert_on_primary_key::<E>())
            .exec_with_returning(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(model.into())
    }

    async fn delete(&self, id: ID) -> Result<(), RepoError> {
        let result = E::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
