//! Eager loader for a flat-file fixture repository.
//!
//! Layout: `manufacturers.json` at the root, one directory per manufacturer
//! key, one JSON document per fixture. Everything is read once, up front; a
//! fixture that fails is recorded and the pass continues with the rest.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::errors::Error;
use crate::fixture::key::{IntoValidKey, Key};
use crate::fixture::manufacturer::Manufacturer;
use crate::parse::{assemble_fixture, parse_manufacturers, raw, ParsedManufacturers};
use crate::problems::Problems;
use crate::register::Register;
use crate::validate::{validate, ValidatedFixture};

/// What one fixture file turned out to be.
#[derive(Debug)]
pub enum FixtureFile {
    Fixture(Box<ValidatedFixture>),
    Redirect(raw::RedirectDocument),
}

#[derive(Debug)]
pub struct LoadedFixture {
    pub manufacturer_key: Key,
    pub fixture_key: Key,
    /// Fatal errors stay with their file; they never abort the batch.
    pub outcome: Result<FixtureFile, Error>,
}

/// The whole repository after one load pass.
#[derive(Debug)]
pub struct Corpus {
    pub manufacturers: BTreeMap<Key, Arc<Manufacturer>>,
    pub fixtures: Vec<LoadedFixture>,
    pub register: Register,
    /// Corpus-level problems: manufacturer uniqueness, register uniqueness,
    /// dangling redirects.
    pub problems: Problems,
    /// Directories that do not belong to any listed manufacturer.
    pub errors: Vec<Error>,
}

pub fn load_directory(dir: &Path) -> Result<Corpus, Error> {
    let manufacturers_path = dir.join("manufacturers.json");
    let manufacturers_json = fs::read_to_string(&manufacturers_path)
        .map_err(|e| Error::Read(manufacturers_path.into_boxed_path(), e))?;
    let ParsedManufacturers {
        manufacturers,
        mut problems,
    } = parse_manufacturers(&manufacturers_json)?;

    let mut register = Register::new(&manufacturers, &mut problems);
    let mut fixtures = vec![];
    let mut errors = vec![];

    for entry in fs::read_dir(dir).map_err(|e| Error::ReadDir(dir.into(), e))? {
        let entry = entry.map_err(|e| Error::ReadDir(dir.into(), e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(dir_name) = path.file_name().and_then(|n| n.to_str()) else {
            errors.push(Error::InvalidFileName(path.display().to_string()));
            continue;
        };
        let manufacturer_key = dir_name.into_valid();
        let Some(manufacturer) = manufacturers.get(&manufacturer_key) else {
            errors.push(Error::UnknownManufacturer(dir_name.to_owned()));
            continue;
        };

        let mut fixture_paths: Vec<_> = fs::read_dir(&path)
            .map_err(|e| Error::ReadDir(path.clone().into_boxed_path(), e))?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        fixture_paths.sort();

        for fixture_path in fixture_paths {
            let Some(stem) = fixture_path.file_stem().and_then(|s| s.to_str()) else {
                errors.push(Error::InvalidFileName(fixture_path.display().to_string()));
                continue;
            };
            let fixture_key = stem.into_valid();
            let outcome = load_fixture_file(
                &fixture_path,
                manufacturer,
                &manufacturer_key,
                &fixture_key,
                &mut register,
                &mut problems,
            );
            fixtures.push(LoadedFixture {
                manufacturer_key: manufacturer_key.clone(),
                fixture_key,
                outcome,
            });
        }
    }

    register.check_redirects(&mut problems);

    Ok(Corpus {
        manufacturers,
        fixtures,
        register,
        problems,
        errors,
    })
}

fn load_fixture_file(
    path: &Path,
    manufacturer: &Arc<Manufacturer>,
    manufacturer_key: &Key,
    fixture_key: &Key,
    register: &mut Register,
    problems: &mut Problems,
) -> Result<FixtureFile, Error> {
    let json = fs::read_to_string(path).map_err(|e| Error::Read(path.into(), e))?;
    let value: serde_json::Value = serde_json::from_str(&json)?;

    if value.get("redirectTo").is_some() {
        let doc: raw::RedirectDocument = serde_json::from_value(value)?;
        register.add_fixture_redirect(manufacturer_key, fixture_key, &doc, problems);
        return Ok(FixtureFile::Redirect(doc));
    }

    let doc: raw::FixtureDocument = serde_json::from_value(value)?;
    register.add_fixture(manufacturer_key, fixture_key, &doc, problems);
    let parsed = assemble_fixture(manufacturer.clone(), fixture_key.clone(), doc);
    Ok(FixtureFile::Fixture(Box::new(validate(parsed))))
}
