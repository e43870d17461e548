use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "person")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub second_name: String,
    pub birth_date: String,
    pub death_date: Option<String>,
    pub description: String,
    pub image: String,
    pub slug: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::person_country::Entity")]
    PersonCountry,
}

impl Related<super::person_country::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PersonCountry.def()
    }
}

impl Related<super::country::Entity> for Entity {
    fn to() -> RelationDef {
        super::person_country::Relation::Country.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::person_country::Relation::Person.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn full_name(&self) -> String {
        if self.second_name.is_empty() {
            format!("{} {}", self.first_name, self.last_name)
        } else {
            format!("{} {} {}", self.first_name, self.second_name, self.last_name)
        }
    }
}
