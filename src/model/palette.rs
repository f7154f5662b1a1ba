//! Fixed color palette for point styling.

use serde::{Deserialize, Serialize};

use crate::model::Rgba;

/// Default chromosome colors, indexed from 1.
const CHROMOSOME_COLORS: [[u8; 3]; 24] = [
    [38, 47, 143],
    [249, 16, 30],
    [91, 180, 43],
    [226, 44, 144],
    [248, 217, 48],
    [15, 65, 11],
    [121, 103, 186],
    [158, 41, 48],
    [111, 198, 149],
    [43, 106, 124],
    [18, 10, 98],
    [143, 200, 73],
    [233, 146, 202],
    [144, 51, 157],
    [93, 9, 69],
    [242, 22, 80],
    [248, 184, 110],
    [17, 20, 8],
    [121, 159, 92],
    [250, 106, 33],
    [113, 87, 23],
    [152, 215, 215],
    [172, 188, 219],
    [94, 65, 94],
];

/// Ordered list of colors looked up by a 1-based style index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette {
    colors: Vec<[u8; 3]>,
}

impl Palette {
    pub fn new(colors: Vec<[u8; 3]>) -> Self {
        Self { colors }
    }

    /// The 24-color chromosome palette.
    pub fn chromosomes() -> Self {
        Self::new(CHROMOSOME_COLORS.to_vec())
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Opaque color for a 1-based index, or `None` outside `1..=len`.
    pub fn get(&self, index: i64) -> Option<Rgba> {
        let slot = usize::try_from(index).ok()?.checked_sub(1)?;
        self.colors
            .get(slot)
            .map(|&[r, g, b]| Rgba::rgb(r, g, b))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::chromosomes()
    }
}
