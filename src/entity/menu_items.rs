use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "menu_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::restaurant_profiles::Entity",
        from = "Column::RestaurantId",
        to = "super::restaurant_profiles::Column::Id"
    )]
    RestaurantProfiles,
}

impl Related<super::restaurant_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RestaurantProfiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
