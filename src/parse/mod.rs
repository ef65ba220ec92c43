mod channels;
mod modes;
pub mod raw;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::Error;
use crate::fixture::fixture::{Category, Fixture};
use crate::fixture::key::Key;
use crate::fixture::manufacturer::Manufacturer;
use crate::fixture::matrix::Matrix;
use crate::problems::{HandleProblem, Problem, Problems};

use self::channels::valid_key;

/// A fixture built from its document, together with every problem that was
/// recovered from along the way.
#[derive(Debug)]
pub struct ParsedFixture {
    pub fixture: Fixture,
    pub problems: Problems,
}

/// The manufacturers document, keyed and ready to be shared across fixtures.
#[derive(Debug)]
pub struct ParsedManufacturers {
    pub manufacturers: BTreeMap<Key, Arc<Manufacturer>>,
    pub problems: Problems,
}

/// Parses one fixture document. A structurally invalid document is a fatal
/// [`Error`] for this fixture; everything semantic is recovered from and
/// recorded in [`ParsedFixture::problems`].
pub fn parse_fixture(
    manufacturer: Arc<Manufacturer>,
    key: Key,
    document: &str,
) -> Result<ParsedFixture, Error> {
    let doc: raw::FixtureDocument = serde_json::from_str(document)?;
    Ok(assemble_fixture(manufacturer, key, doc))
}

/// Builds the fixture model from an already-deserialized document. All
/// derived views (fine/switching channels, key index, mode slots) are built
/// eagerly here; the fixture is immutable afterwards.
pub fn assemble_fixture(
    manufacturer: Arc<Manufacturer>,
    key: Key,
    doc: raw::FixtureDocument,
) -> ParsedFixture {
    let mut problems = Problems::new();

    let categories = doc
        .categories
        .iter()
        .enumerate()
        .filter_map(|(i, category)| {
            category
                .parse::<Category>()
                .map_err(|_| Problem::UnknownCategory(category.clone()).at(format!("categories/{i}")))
                .ok_or_handled_by("ignoring category", &mut problems)
        })
        .collect();

    let matrix = doc
        .matrix
        .as_ref()
        .map(|matrix_doc| build_matrix(matrix_doc, &mut problems));

    let set = channels::build_channels(
        &doc.available_channels,
        &doc.template_channels,
        matrix.as_ref(),
        &mut problems,
    );
    let mut null = vec![];
    let modes = modes::resolve_modes(&doc.modes, &set, &mut null, &mut problems);

    let fixture = Fixture {
        key,
        name: doc.name,
        short_name: doc.short_name,
        manufacturer,
        categories,
        meta: doc.meta,
        comment: doc.comment,
        rdm: doc.rdm,
        physical: doc.physical,
        matrix,
        coarse: set.coarse,
        fine: set.fine,
        switching: set.switching,
        null,
        channel_order: set.channel_order,
        by_key: set.by_key,
        modes,
    };

    ParsedFixture { fixture, problems }
}

fn build_matrix(doc: &raw::MatrixDocument, problems: &mut Problems) -> Matrix {
    let mut matrix = match (&doc.pixel_count, &doc.pixel_keys) {
        (Some(_), Some(keys)) => {
            Problem::ConflictingMatrixDefinition
                .at("matrix")
                .handled_by("using pixelKeys", problems);
            matrix_from_keys(keys, problems)
        }
        (None, Some(keys)) => matrix_from_keys(keys, problems),
        (Some(count), None) => Matrix::from_pixel_count(*count),
        (None, None) => {
            Problem::MissingMatrixPixels
                .at("matrix")
                .handled_by("using an empty matrix", problems);
            Matrix::default()
        }
    };

    let mut groups = BTreeMap::new();
    for (group, members) in &doc.pixel_groups {
        let group_key = valid_key(group, "matrix/pixelGroups", problems);
        let members = members
            .iter()
            .filter_map(|member| {
                let member = valid_key(member, "matrix/pixelGroups", problems);
                if matrix.has_pixel(&member) {
                    Some(member)
                } else {
                    Problem::UnknownPixelKey {
                        key: member,
                        referenced_in: format!("pixel group '{group_key}'"),
                    }
                    .at("matrix/pixelGroups")
                    .handled_by("ignoring group member", problems);
                    None
                }
            })
            .collect();
        groups.insert(group_key, members);
    }
    matrix.set_groups(groups);

    matrix
}

fn matrix_from_keys(keys: &[Vec<Vec<Option<String>>>], problems: &mut Problems) -> Matrix {
    let keys = keys
        .iter()
        .map(|plane| {
            plane
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| {
                            cell.as_deref()
                                .map(|key| valid_key(key, "matrix/pixelKeys", problems))
                        })
                        .collect()
                })
                .collect()
        })
        .collect();
    Matrix::from_pixel_keys(keys)
}

/// Parses the manufacturers document into shared manufacturer records.
pub fn parse_manufacturers(document: &str) -> Result<ParsedManufacturers, Error> {
    let doc: raw::ManufacturersDocument = serde_json::from_str(document)?;
    let mut problems = Problems::new();

    let manufacturers = doc
        .into_iter()
        .map(|(key_str, mut manufacturer)| {
            let key = valid_key(&key_str, "manufacturers", &mut problems);
            manufacturer.key = key.clone();
            (key, Arc::new(manufacturer))
        })
        .collect();

    Ok(ParsedManufacturers {
        manufacturers,
        problems,
    })
}

/// Parses a redirect document (a fixture file that is only a pointer to
/// another fixture).
pub fn parse_redirect(document: &str) -> Result<raw::RedirectDocument, Error> {
    Ok(serde_json::from_str(document)?)
}
