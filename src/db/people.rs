//! Person persistence.
//!
//! Every function takes any `ConnectionTrait`, so it can run on the plain
//! connection or inside a caller's open transaction.

use crate::{
    core::person::Person,
    entities::{PersonColumn, PersonEntity, person},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::OnConflict};
use tracing::trace;

impl From<person::Model> for Person {
    fn from(model: person::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            balance: model.balance,
            position: model.position,
        }
    }
}

/// Loads every person, ordered by id.
pub async fn load_people<C>(db: &C) -> Result<Vec<Person>>
where
    C: ConnectionTrait,
{
    let models = PersonEntity::find()
        .order_by_asc(PersonColumn::Id)
        .all(db)
        .await?;
    Ok(models.into_iter().map(Person::from).collect())
}

/// Inserts a person or overwrites the stored row with the same id.
pub async fn persist_person<C>(db: &C, person: &Person) -> Result<()>
where
    C: ConnectionTrait,
{
    trace!(id = person.id, balance = person.balance, "Persisting person");
    let model = person::ActiveModel {
        id: Set(person.id),
        name: Set(person.name.clone()),
        balance: Set(person.balance),
        position: Set(person.position),
    };

    PersonEntity::insert(model)
        .on_conflict(
            OnConflict::column(PersonColumn::Id)
                .update_columns([
                    PersonColumn::Name,
                    PersonColumn::Balance,
                    PersonColumn::Position,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_persist_and_load_people() -> Result<()> {
        let db = setup_test_db().await?;

        let mut alice = Person::new("Alice");
        alice.id = 1;
        alice.position = 1;
        persist_person(&db, &alice).await?;

        let mut bob = Person::new("Bob");
        bob.id = 2;
        bob.position = 2;
        bob.balance = -450;
        persist_person(&db, &bob).await?;

        let people = load_people(&db).await?;
        assert_eq!(people, vec![alice, bob]);
        Ok(())
    }

    #[tokio::test]
    async fn test_persist_person_overwrites() -> Result<()> {
        let db = setup_test_db().await?;

        let mut alice = Person::new("Alice");
        alice.id = 1;
        persist_person(&db, &alice).await?;

        alice.balance = 1200;
        alice.name = "Alice B.".to_string();
        persist_person(&db, &alice).await?;

        let people = load_people(&db).await?;
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].balance, 1200);
        assert_eq!(people[0].name, "Alice B.");
        Ok(())
    }
}
