use std::collections::BTreeMap;

use super::key::{IntoValidKey, Key};

/// Pixel structure of a fixture with repeated pixel groups.
///
/// Pixels are addressed by key and carry a 1-based XYZ position. Template
/// channels are instantiated once per pixel key (and once per pixel group
/// key) when the fixture is assembled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix {
    /// Pixel keys with their positions, in Z, then Y, then X order.
    pixels: Vec<(Key, [u32; 3])>,
    /// Named groups of pixel keys, e.g. rows or halves.
    groups: BTreeMap<Key, Vec<Key>>,
}

impl Matrix {
    /// Matrix from per-pixel counts in X, Y and Z direction. Pixel keys are
    /// generated as `(x, y, z)`.
    pub fn from_pixel_count(count: [u32; 3]) -> Self {
        let [x_count, y_count, z_count] = count;
        let mut pixels = vec![];
        for z in 1..=z_count {
            for y in 1..=y_count {
                for x in 1..=x_count {
                    pixels.push((format!("({x}, {y}, {z})").into_valid(), [x, y, z]));
                }
            }
        }
        Matrix {
            pixels,
            groups: BTreeMap::new(),
        }
    }

    /// Matrix from explicitly named pixels: the outer level is Z, then rows
    /// (Y), then columns (X). `None` entries are holes in the layout.
    pub fn from_pixel_keys(keys: Vec<Vec<Vec<Option<Key>>>>) -> Self {
        let mut pixels = vec![];
        for (z, plane) in keys.into_iter().enumerate() {
            for (y, row) in plane.into_iter().enumerate() {
                for (x, key) in row.into_iter().enumerate() {
                    if let Some(key) = key {
                        pixels.push((key, [x as u32 + 1, y as u32 + 1, z as u32 + 1]));
                    }
                }
            }
        }
        Matrix {
            pixels,
            groups: BTreeMap::new(),
        }
    }

    pub fn set_groups(&mut self, groups: BTreeMap<Key, Vec<Key>>) {
        self.groups = groups;
    }

    pub fn pixel_keys(&self) -> impl Iterator<Item = &Key> {
        self.pixels.iter().map(|(key, _)| key)
    }

    pub fn position(&self, key: &Key) -> Option<[u32; 3]> {
        self.pixels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, position)| *position)
    }

    pub fn groups(&self) -> &BTreeMap<Key, Vec<Key>> {
        &self.groups
    }

    pub fn has_pixel(&self, key: &Key) -> bool {
        self.position(key).is_some()
    }

    /// Pixel keys followed by group keys, the instantiation order for
    /// template channels.
    pub fn template_keys(&self) -> Vec<&Key> {
        self.pixel_keys().chain(self.groups.keys()).collect()
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_pixel_keys() {
        let matrix = Matrix::from_pixel_count([2, 2, 1]);
        let keys: Vec<&str> = matrix.pixel_keys().map(Key::as_str).collect();
        assert_eq!(keys, ["(1, 1, 1)", "(2, 1, 1)", "(1, 2, 1)", "(2, 2, 1)"]);
        assert_eq!(matrix.position(&"(2, 1, 1)".into_valid()), Some([2, 1, 1]));
    }

    #[test]
    fn explicit_pixel_keys_with_holes() {
        let matrix = Matrix::from_pixel_keys(vec![vec![
            vec![Some("L".into_valid()), None, Some("R".into_valid())],
        ]]);
        assert_eq!(matrix.pixel_count(), 2);
        assert_eq!(matrix.position(&"R".into_valid()), Some([3, 1, 1]));
        assert!(!matrix.has_pixel(&"M".into_valid()));
    }

    #[test]
    fn template_keys_include_groups() {
        let mut matrix = Matrix::from_pixel_count([2, 1, 1]);
        matrix.set_groups(BTreeMap::from([(
            "All".into_valid(),
            vec!["(1, 1, 1)".into_valid(), "(2, 1, 1)".into_valid()],
        )]));
        let keys: Vec<&str> = matrix.template_keys().iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["(1, 1, 1)", "(2, 1, 1)", "All"]);
    }
}
