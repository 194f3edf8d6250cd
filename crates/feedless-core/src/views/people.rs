use std::collections::HashSet;

use futures::TryStreamExt;
use tracing::debug;

use super::Queries;
use crate::constants::content_types;
use crate::error::QueryResult;
use crate::models::{AttributeValue, Content, Profile};
use crate::query::{Field, Predicate, Query};

impl Queries {
    /// People whose self-asserted name contains `search` (case-sensitive).
    ///
    /// One profile per identity, built from that identity's newest matching
    /// self-assertion that it has not deleted; ordered newest first.
    pub async fn search_people(&self, search: &str) -> QueryResult<Vec<Profile>> {
        debug!(target: "queries::people", search, "Fetching");

        let named = Query::new(Predicate::And(vec![
            Predicate::content_type(content_types::ABOUT),
            Predicate::IsString(Field::Name),
        ]));

        let tombstones = self.tombstones().await?;
        let mut seen = HashSet::new();
        let mut people = Vec::new();
        let mut records = self.log.read(&named);
        while let Some(record) = records.try_next().await? {
            if !record.is_self_assertion()
                || seen.contains(record.author())
                || tombstones.hides(&record)
            {
                continue;
            }
            let Content::About(about) = record.content() else {
                continue;
            };
            let Some(name) = about.name.as_ref().and_then(AttributeValue::as_text) else {
                continue;
            };
            if !name.contains(search) {
                continue;
            }

            seen.insert(record.author().to_string());
            people.push(Profile {
                id: about.about.clone(),
                name: Some(name.to_string()),
                image: about.image.as_ref().and_then(AttributeValue::value).map(str::to_string),
                description: about
                    .description
                    .as_ref()
                    .and_then(AttributeValue::value)
                    .map(str::to_string),
            });
        }

        debug!(target: "queries::people", count = people.len(), "Done");
        Ok(people)
    }
}
