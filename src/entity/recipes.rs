use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub ingredients: String,
    pub instructions: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::recipe_likes::Entity")]
    RecipeLikes,
    #[sea_orm(has_many = "super::recipe_ratings::Entity")]
    RecipeRatings,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::recipe_likes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeLikes.def()
    }
}

impl Related<super::recipe_ratings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeRatings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
