///! Join of live observations with the reference snapshot

use skywatch_common::EnrichedRecord;

use super::normalize::TextNormalizer;
use crate::config::EnrichmentConfig;
use crate::module::feed::Observation;
use crate::module::reference::{ReferenceSchema, ReferenceSnapshot};

pub struct Enricher {
    normalizer: TextNormalizer,
    unknown_country: String,
    not_applicable: String,
    max_results: usize,
}

impl Enricher {
    pub fn from_config(config: &EnrichmentConfig) -> Self {
        Self {
            normalizer: TextNormalizer::from_config(config),
            unknown_country: config.unknown_country.clone(),
            not_applicable: config.not_applicable.clone(),
            max_results: config.max_results,
        }
    }

    /// Lowest `max_results` observations by altitude, each with country,
    /// purpose and operator filled in from `snapshot` or a sentinel.
    ///
    /// Ties in altitude keep their input order.
    pub fn enrich(
        &self,
        observations: &[Observation],
        snapshot: &ReferenceSnapshot,
    ) -> Vec<EnrichedRecord> {
        let mut ordered: Vec<&Observation> = observations.iter().collect();
        ordered.sort_by(|a, b| a.altitude.total_cmp(&b.altitude));
        ordered.truncate(self.max_results);

        let schema = snapshot.schema.filter(|_| snapshot.mode.is_rich());

        ordered
            .into_iter()
            .map(|obs| match schema {
                Some(schema) => self.lookup(obs, snapshot, &schema),
                None => self.sentinel(obs),
            })
            .collect()
    }

    fn lookup(
        &self,
        obs: &Observation,
        snapshot: &ReferenceSnapshot,
        schema: &ReferenceSchema,
    ) -> EnrichedRecord {
        let mut record = self.sentinel(obs);
        let Some(row) = snapshot.find_row(obs.norad_id) else {
            return record;
        };

        let field = |col: Option<usize>| {
            let cell = col.and_then(|c| snapshot.table.cell(row, c));
            self.normalizer.normalize(cell)
        };

        if let Some(country) = field(Some(schema.country)) {
            record.country = country;
        }
        if let Some(purpose) = field(Some(schema.purpose)) {
            record.purpose = purpose;
        }
        if let Some(user) = field(schema.user) {
            record.user = user;
        }
        record
    }

    fn sentinel(&self, obs: &Observation) -> EnrichedRecord {
        EnrichedRecord {
            name: obs.name.clone(),
            norad_id: obs.norad_id,
            latitude: obs.latitude,
            longitude: obs.longitude,
            altitude: obs.altitude,
            country: self.unknown_country.clone(),
            purpose: self.not_applicable.clone(),
            user: self.not_applicable.clone(),
        }
    }
}

impl Default for Enricher {
    fn default() -> Self {
        Self::from_config(&EnrichmentConfig::default())
    }
}
