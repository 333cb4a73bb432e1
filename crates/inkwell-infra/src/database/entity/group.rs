//! Group entity for SeaORM. Stored as `groups`.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for inkwell_core::domain::Group {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            description: model.description,
        }
    }
}

impl From<inkwell_core::domain::Group> for ActiveModel {
    fn from(group: inkwell_core::domain::Group) -> Self {
        Self {
            id: Set(group.id),
            title: Set(group.title),
            slug: Set(group.slug),
            description: Set(group.description),
        }
    }
}
