//! Place-name normalisation.
//!
//! Operators type municipality names freely ("Buga", "buga ", "Guadalajara de
//! Buga"). Aggregated counts are joined against a municipal boundary dataset,
//! so every spelling must collapse to the key that dataset uses.
//!
//! Matching is done on a folded form: trimmed, inner whitespace collapsed,
//! diacritics removed, uppercased. Names missing from the synonym table pass
//! through in folded form; they never fail, they simply may not join.

use std::{collections::HashMap, sync::LazyLock};

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Spelling → canonical boundary key. Keys and values are already folded.
const SYNONYMS: &[(&str, &str)] = &[
  ("BUGA", "GUADALAJARA DE BUGA"),
  ("GUADALAJARA BUGA", "GUADALAJARA DE BUGA"),
  ("SANTIAGO DE CALI", "CALI"),
  ("CALI VALLE", "CALI"),
  ("BOGOTA", "BOGOTA, D.C."),
  ("BOGOTA DC", "BOGOTA, D.C."),
  ("BOGOTA D.C", "BOGOTA, D.C."),
  ("BOGOTA, D.C", "BOGOTA, D.C."),
  ("SANTAFE DE BOGOTA", "BOGOTA, D.C."),
  ("DARIEN", "CALIMA"),
  ("CALIMA DARIEN", "CALIMA"),
  ("CALIMA EL DARIEN", "CALIMA"),
  ("RIO FRIO", "RIOFRIO"),
  ("BUGA LA GRANDE", "BUGALAGRANDE"),
  ("LA UNION VALLE", "LA UNION"),
  ("SAN PEDRO VALLE", "SAN PEDRO"),
  ("JAMUNDI VALLE", "JAMUNDI"),
  ("MEDELLIN ANTIOQUIA", "MEDELLIN"),
  ("PUERTO BUENAVENTURA", "BUENAVENTURA"),
  ("EL CERRITO VALLE", "EL CERRITO"),
];

/// Reference coordinates (lat, lon) for the campaign's core municipalities.
const CENTROIDS: &[(&str, (f64, f64))] = &[
  ("GUADALAJARA DE BUGA", (3.9009, -76.3008)),
  ("CALI", (3.4516, -76.5320)),
  ("BOGOTA, D.C.", (4.7110, -74.0721)),
  ("MEDELLIN", (6.2442, -75.5812)),
  ("PALMIRA", (3.5394, -76.3036)),
  ("TULUA", (4.0847, -76.1954)),
  ("CARTAGO", (4.7464, -75.9117)),
  ("YUMBO", (3.5411, -76.4911)),
  ("JAMUNDI", (3.2612, -76.5350)),
  ("SAN PEDRO", (3.9936, -76.2281)),
  ("GUACARI", (3.7633, -76.3325)),
  ("CALIMA", (3.9314, -76.5186)),
];

/// Where unknown places are drawn on a point map.
pub const DEFAULT_CENTROID: (f64, f64) = (3.9, -76.3);

static CANONICAL: LazyLock<PlaceNormalizer> = LazyLock::new(PlaceNormalizer::default);

/// Fold a name for comparison: trim, collapse whitespace, strip diacritics,
/// drop trailing dots, uppercase.
pub fn fold(raw: &str) -> String {
  let stripped: String = raw.nfd().filter(|c| !is_combining_mark(*c)).collect();
  let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
  collapsed.trim_end_matches('.').to_uppercase()
}

/// Normalise with the built-in synonym table.
pub fn normalize(raw: &str) -> String { CANONICAL.normalize(raw) }

/// Reference coordinates for a canonical key, or [`DEFAULT_CENTROID`].
pub fn centroid(canonical_key: &str) -> (f64, f64) {
  CENTROIDS
    .iter()
    .find(|(k, _)| *k == canonical_key)
    .map(|(_, c)| *c)
    .unwrap_or(DEFAULT_CENTROID)
}

/// A synonym table with pass-through fallback.
#[derive(Debug, Clone)]
pub struct PlaceNormalizer {
  synonyms: HashMap<String, String>,
}

impl Default for PlaceNormalizer {
  fn default() -> Self {
    Self {
      synonyms: SYNONYMS
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect(),
    }
  }
}

impl PlaceNormalizer {
  /// Add or override synonyms. Keys are folded; values are resolved through
  /// the table as it stands, so a target spelled like a built-in key lands
  /// on that key.
  pub fn extend<I, K, V>(&mut self, synonyms: I)
  where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
  {
    for (k, v) in synonyms {
      let canonical = self.normalize(v.as_ref());
      self.synonyms.insert(fold(k.as_ref()), canonical);
    }
  }

  pub fn normalize(&self, raw: &str) -> String {
    let folded = fold(raw);
    match self.synonyms.get(&folded) {
      Some(canonical) => canonical.clone(),
      None => folded,
    }
  }
}
