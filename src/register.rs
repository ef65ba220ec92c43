//! Corpus-wide fixture index: filesystem paths, manufacturer and category
//! listings, contributors, RDM ids and chronological ordering.
//!
//! The register is rebuilt from scratch on every invocation. It reads raw
//! fixture documents instead of assembled [`Fixture`](crate::Fixture)s so an
//! index pass does not have to instantiate every fixture. Uniqueness
//! invariants hold across the entire corpus, so all fixtures must be added
//! before the checks are final.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::fixture::fixture::Category;
use crate::fixture::key::Key;
use crate::fixture::manufacturer::Manufacturer;
use crate::parse::raw;
use crate::problems::{Problem, Problems};

/// Why a fixture file is a pointer to another fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum RedirectReason {
    /// The fixture was renamed or moved; the old file only forwards.
    FixtureRenamed,
    /// The same hardware is sold under a different brand; the redirect is a
    /// full fixture in its own right and stays in canonical listings.
    SameAsDifferentBrand,
}

/// One entry of the filesystem index, keyed by `manufacturer/fixture`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesystemEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modify_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RedirectReason>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RdmEntry {
    pub key: Key,
    /// RDM model id to fixture key.
    pub models: BTreeMap<u16, Key>,
}

/// Deterministic serialization of the register: map keys are sorted
/// lexicographically, fixture lists by manufacturer and key, `lastUpdated`
/// by modification date descending with the key as tie-break.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterExport {
    pub filesystem: BTreeMap<String, FilesystemEntry>,
    pub manufacturers: BTreeMap<Key, Vec<Key>>,
    pub categories: BTreeMap<String, Vec<String>>,
    pub contributors: BTreeMap<String, Vec<String>>,
    pub rdm: BTreeMap<u16, RdmEntry>,
    pub last_updated: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Register {
    filesystem: BTreeMap<String, FilesystemEntry>,
    manufacturers: BTreeMap<Key, Vec<Key>>,
    categories: BTreeMap<Category, Vec<String>>,
    contributors: BTreeMap<String, Vec<String>>,
    /// Manufacturer RDM id to its fixture model index.
    rdm: BTreeMap<u16, (Key, BTreeMap<u16, Key>)>,
    /// Manufacturer key to its RDM id, for model registration.
    manufacturer_rdm_ids: HashMap<Key, u16>,
    /// Case-folded fixture names seen per manufacturer.
    names: HashMap<Key, HashSet<String>>,
    /// Categories of every canonical fixture, for redirect participation.
    fixture_categories: HashMap<String, Vec<Category>>,
}

impl Register {
    /// Builds the empty register over the manufacturer registry and checks
    /// the corpus-global manufacturer invariants: names and RDM ids must be
    /// unique across all manufacturers.
    pub fn new(
        manufacturers: &BTreeMap<Key, Arc<Manufacturer>>,
        problems: &mut Problems,
    ) -> Self {
        let mut register = Register::default();
        let mut seen_names = HashSet::new();

        for (key, manufacturer) in manufacturers {
            let path = format!("manufacturers/{key}");
            if !seen_names.insert(manufacturer.name.to_lowercase()) {
                Problem::DuplicateManufacturerName(manufacturer.name.clone())
                    .at(&path)
                    .handled_by("keeping both manufacturers", problems);
            }
            if let Some(rdm_id) = manufacturer.rdm_id {
                if register.rdm.contains_key(&rdm_id) {
                    Problem::DuplicateManufacturerRdmId(rdm_id)
                        .at(&path)
                        .handled_by("keeping the RDM id of the first manufacturer", problems);
                } else {
                    register.rdm.insert(rdm_id, (key.clone(), BTreeMap::new()));
                    register.manufacturer_rdm_ids.insert(key.clone(), rdm_id);
                }
            }
        }

        register
    }

    /// Indexes one fixture document. Uniqueness violations are reported but
    /// the fixture is still indexed under `filesystem`.
    pub fn add_fixture(
        &mut self,
        manufacturer_key: &Key,
        fixture_key: &Key,
        doc: &raw::FixtureDocument,
        problems: &mut Problems,
    ) {
        let man_fix = format!("{manufacturer_key}/{fixture_key}");

        if self
            .manufacturers
            .get(manufacturer_key)
            .is_some_and(|fixtures| fixtures.contains(fixture_key))
        {
            Problem::DuplicateFixtureKey {
                manufacturer: manufacturer_key.clone(),
                fixture: fixture_key.clone(),
            }
            .at(&man_fix)
            .handled_by("keeping the first definition", problems);
            return;
        }

        let seen_names = self.names.entry(manufacturer_key.clone()).or_default();
        if !seen_names.insert(doc.name.to_lowercase()) {
            Problem::DuplicateFixtureName {
                manufacturer: manufacturer_key.clone(),
                name: doc.name.clone(),
            }
            .at(&man_fix)
            .handled_by("indexing the fixture anyway", problems);
        }

        self.filesystem.insert(
            man_fix.clone(),
            FilesystemEntry {
                name: doc.name.clone(),
                last_modify_date: Some(doc.meta.last_modify_date),
                redirect_to: None,
                reason: None,
            },
        );
        self.manufacturers
            .entry(manufacturer_key.clone())
            .or_default()
            .push(fixture_key.clone());

        let categories: Vec<Category> = doc
            .categories
            .iter()
            .filter_map(|category| category.parse().ok())
            .collect();
        for category in &categories {
            self.categories
                .entry(*category)
                .or_default()
                .push(man_fix.clone());
        }
        self.fixture_categories.insert(man_fix.clone(), categories);

        for author in &doc.meta.authors {
            self.contributors
                .entry(author.clone())
                .or_default()
                .push(man_fix.clone());
        }

        if let Some(rdm) = &doc.rdm {
            if let Some(rdm_id) = self.manufacturer_rdm_ids.get(manufacturer_key) {
                if let Some((_, models)) = self.rdm.get_mut(rdm_id) {
                    if models.contains_key(&rdm.model_id) {
                        Problem::DuplicateRdmModelId {
                            manufacturer: manufacturer_key.clone(),
                            model_id: rdm.model_id,
                        }
                        .at(&man_fix)
                        .handled_by("keeping the first model", problems);
                    } else {
                        models.insert(rdm.model_id, fixture_key.clone());
                    }
                }
            }
        }
    }

    /// Records a fixture file that points at another fixture. The redirect
    /// appears under `filesystem`; it joins its target's canonical listings
    /// only when the reason is [`RedirectReason::SameAsDifferentBrand`].
    pub fn add_fixture_redirect(
        &mut self,
        manufacturer_key: &Key,
        fixture_key: &Key,
        doc: &raw::RedirectDocument,
        problems: &mut Problems,
    ) {
        let man_fix = format!("{manufacturer_key}/{fixture_key}");

        if self.filesystem.contains_key(&man_fix) {
            Problem::DuplicateFixtureKey {
                manufacturer: manufacturer_key.clone(),
                fixture: fixture_key.clone(),
            }
            .at(&man_fix)
            .handled_by("keeping the first definition", problems);
            return;
        }

        self.filesystem.insert(
            man_fix,
            FilesystemEntry {
                name: fixture_key.to_string(),
                last_modify_date: None,
                redirect_to: Some(doc.redirect_to.clone()),
                reason: Some(doc.reason),
            },
        );
    }

    /// Checks that every redirect points at an indexed canonical fixture.
    /// Only meaningful once all fixtures have been added.
    pub fn check_redirects(&self, problems: &mut Problems) {
        for (key, entry) in &self.filesystem {
            if let Some(target) = &entry.redirect_to {
                let target_is_canonical = self
                    .filesystem
                    .get(target)
                    .is_some_and(|t| t.redirect_to.is_none());
                if !target_is_canonical {
                    Problem::RedirectToUnknownFixture {
                        key: key.clone(),
                        target: target.clone(),
                    }
                    .at(key)
                    .handled_by("keeping the dangling redirect", problems);
                }
            }
        }
    }

    /// The deterministic serialization view of the register.
    pub fn to_sorted_export(&self) -> RegisterExport {
        let mut manufacturers: BTreeMap<Key, Vec<Key>> = self
            .manufacturers
            .iter()
            .map(|(key, fixtures)| (key.clone(), fixtures.clone()))
            .collect();
        let mut categories: BTreeMap<String, Vec<String>> = self
            .categories
            .iter()
            .map(|(category, fixtures)| (category.to_string(), fixtures.clone()))
            .collect();

        // SameAsDifferentBrand redirects join their target's listings
        for (key, entry) in &self.filesystem {
            if entry.reason != Some(RedirectReason::SameAsDifferentBrand) {
                continue;
            }
            let Some(target) = &entry.redirect_to else {
                continue;
            };
            if let Some((man, fix)) = key.split_once('/') {
                manufacturers
                    .entry(Key::try_from(man).unwrap_or_default())
                    .or_default()
                    .push(Key::try_from(fix).unwrap_or_default());
            }
            if let Some(target_categories) = self.fixture_categories.get(target) {
                for category in target_categories {
                    categories
                        .entry(category.to_string())
                        .or_default()
                        .push(key.clone());
                }
            }
        }

        for fixtures in manufacturers.values_mut() {
            fixtures.sort();
        }
        for fixtures in categories.values_mut() {
            fixtures.sort();
        }

        let mut contributors: BTreeMap<String, Vec<String>> = self
            .contributors
            .iter()
            .map(|(author, fixtures)| {
                let mut fixtures = fixtures.clone();
                fixtures.sort();
                (author.clone(), fixtures)
            })
            .collect();
        contributors.values_mut().for_each(|fixtures| fixtures.dedup());

        let mut last_updated: Vec<(&String, NaiveDate)> = self
            .filesystem
            .iter()
            .filter_map(|(key, entry)| entry.last_modify_date.map(|date| (key, date)))
            .collect();
        last_updated.sort_by(|(a_key, a_date), (b_key, b_date)| {
            b_date.cmp(a_date).then_with(|| a_key.cmp(b_key))
        });

        RegisterExport {
            filesystem: self.filesystem.clone(),
            manufacturers,
            categories,
            contributors,
            rdm: self
                .rdm
                .iter()
                .map(|(rdm_id, (key, models))| {
                    (
                        *rdm_id,
                        RdmEntry {
                            key: key.clone(),
                            models: models.clone(),
                        },
                    )
                })
                .collect(),
            last_updated: last_updated.into_iter().map(|(key, _)| key.clone()).collect(),
        }
    }
}
