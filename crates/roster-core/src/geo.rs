//! Joining place counts against a municipal boundary document.
//!
//! Only the name key and an id are read from each feature; geometry is left
//! untouched for whatever renders the map.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::{
  Error, Result,
  aggregate::{Tally, count_by_place},
  place::{PlaceNormalizer, centroid, fold},
  record::CitizenRecord,
};

/// Property carrying the municipality name in the national boundary dataset.
pub const DEFAULT_NAME_PROPERTY: &str = "NOM_MPIO";

/// One feature's join key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundaryKey {
  /// The name exactly as the dataset spells it.
  pub name_key:    String,
  pub geometry_id: String,
}

/// Boundary keys indexed by folded name.
#[derive(Debug, Clone, Default)]
pub struct BoundaryIndex {
  keys: HashMap<String, BoundaryKey>,
}

impl BoundaryIndex {
  /// Read `features[*].properties[name_property]` from a GeoJSON-like
  /// document. A feature's id is its `id` member when present, else its
  /// position. Features without the name property are skipped; on duplicate
  /// names the first feature wins.
  pub fn from_document(doc: &Value, name_property: &str) -> Result<Self> {
    let features = doc
      .get("features")
      .and_then(Value::as_array)
      .ok_or_else(|| Error::Boundary("missing `features` array".to_owned()))?;

    let mut keys = HashMap::with_capacity(features.len());
    for (position, feature) in features.iter().enumerate() {
      let Some(name) = feature
        .get("properties")
        .and_then(|p| p.get(name_property))
        .and_then(Value::as_str)
      else {
        continue;
      };
      let geometry_id = match feature.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => position.to_string(),
      };
      keys.entry(fold(name)).or_insert_with(|| BoundaryKey {
        name_key: name.to_owned(),
        geometry_id,
      });
    }

    if keys.is_empty() {
      return Err(Error::Boundary(format!("no feature carries `{name_property}`")));
    }
    Ok(Self { keys })
  }

  /// Look up a canonical place key.
  pub fn resolve(&self, canonical: &str) -> Option<&BoundaryKey> {
    self.keys.get(&fold(canonical))
  }

  pub fn len(&self) -> usize { self.keys.len() }

  pub fn is_empty(&self) -> bool { self.keys.is_empty() }
}

/// A colourable map cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoroplethCell {
  pub location_key: String,
  pub geometry_id:  String,
  pub count:        usize,
}

/// Place counts split into what joins the boundary data and what does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choropleth {
  pub cells:     Vec<ChoroplethCell>,
  /// Canonical keys with no polygon; these would silently go uncoloured.
  pub unmatched: Vec<Tally>,
}

pub fn choropleth(
  records: &[CitizenRecord],
  normalizer: &PlaceNormalizer,
  index: &BoundaryIndex,
) -> Choropleth {
  let mut cells = Vec::new();
  let mut unmatched = Vec::new();
  for tally in count_by_place(records, normalizer).iter() {
    match index.resolve(&tally.value) {
      Some(key) => cells.push(ChoroplethCell {
        location_key: key.name_key.clone(),
        geometry_id:  key.geometry_id.clone(),
        count:        tally.count,
      }),
      None => unmatched.push(tally.clone()),
    }
  }
  Choropleth { cells, unmatched }
}

/// A place drawn as a single marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacePoint {
  pub location_key: String,
  pub lat:          f64,
  pub lon:          f64,
  pub count:        usize,
}

/// Place counts positioned at their reference coordinates. Places without
/// coordinates share the default marker.
pub fn points(records: &[CitizenRecord], normalizer: &PlaceNormalizer) -> Vec<PlacePoint> {
  count_by_place(records, normalizer)
    .iter()
    .map(|tally| {
      let (lat, lon) = centroid(&tally.value);
      PlacePoint { location_key: tally.value.clone(), lat, lon, count: tally.count }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use serde_json::json;

  use super::*;

  fn doc() -> Value {
    json!({
      "type": "FeatureCollection",
      "features": [
        { "id": 76111, "properties": { "NOM_MPIO": "GUADALAJARA DE BUGA" }, "geometry": null },
        { "properties": { "NOM_MPIO": "TULUÁ" }, "geometry": null },
        { "id": "76001", "properties": { "NOM_MPIO": "CALI" }, "geometry": null },
        { "properties": { "OTHER": "X" }, "geometry": null }
      ]
    })
  }

  fn record(city: &str) -> CitizenRecord {
    CitizenRecord {
      registered_at: Utc::now(),
      registered_by: "fabian".into(),
      full_name:     "N".into(),
      national_id:   "1".into(),
      phone:         "2".into(),
      occupation:    "O".into(),
      address:       "A".into(),
      neighborhood:  "B".into(),
      city:          city.into(),
      voting_site:   None,
    }
  }

  #[test]
  fn index_reads_names_and_ids() {
    let index = BoundaryIndex::from_document(&doc(), DEFAULT_NAME_PROPERTY).unwrap();
    assert_eq!(index.len(), 3);
    assert_eq!(index.resolve("GUADALAJARA DE BUGA").unwrap().geometry_id, "76111");
    assert_eq!(index.resolve("CALI").unwrap().geometry_id, "76001");
    // Accented dataset names still join, and keep their own spelling.
    let tulua = index.resolve("TULUA").unwrap();
    assert_eq!(tulua.name_key, "TULUÁ");
    assert_eq!(tulua.geometry_id, "1");
  }

  #[test]
  fn documents_without_features_are_rejected() {
    assert!(BoundaryIndex::from_document(&json!({}), DEFAULT_NAME_PROPERTY).is_err());
    assert!(BoundaryIndex::from_document(&doc(), "MISSING").is_err());
  }

  #[test]
  fn choropleth_joins_and_reports_misses() {
    let index = BoundaryIndex::from_document(&doc(), DEFAULT_NAME_PROPERTY).unwrap();
    let rs = vec![record("buga"), record("Tuluá"), record("BUGA"), record("Atlantis")];
    let map = choropleth(&rs, &PlaceNormalizer::default(), &index);

    assert_eq!(map.cells.len(), 2);
    assert_eq!(map.cells[0], ChoroplethCell {
      location_key: "GUADALAJARA DE BUGA".into(),
      geometry_id:  "76111".into(),
      count:        2,
    });
    assert_eq!(map.cells[1].location_key, "TULUÁ");
    assert_eq!(map.unmatched, vec![Tally { value: "ATLANTIS".into(), count: 1 }]);
  }

  #[test]
  fn points_use_reference_coordinates() {
    let rs = vec![record("Cali"), record("Santiago de Cali"), record("Atlantis")];
    let pts = points(&rs, &PlaceNormalizer::default());
    assert_eq!(pts.len(), 2);
    assert_eq!(pts[0], PlacePoint {
      location_key: "CALI".into(),
      lat:          3.4516,
      lon:          -76.5320,
      count:        2,
    });
    assert_eq!((pts[1].lat, pts[1].lon), crate::place::DEFAULT_CENTROID);
  }
}
