//! Citizen records: the rows of the registration table.
//!
//! A record is written once and never updated. The column order of the
//! backing table is fixed by [`Field`]; the header row is written from
//! [`Field::header`] when the table is created.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::{Error, Result, ValidationErrors, place::fold};

/// Cell format for `Timestamp`, as the campaign sheet has always stored it.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── Field ───────────────────────────────────────────────────────────────────

/// One column of the registration table, in storage order.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumCount,
)]
#[serde(rename_all = "snake_case")]
pub enum Field {
  RegisteredAt,
  RegisteredBy,
  FullName,
  NationalId,
  Phone,
  Occupation,
  Address,
  Neighborhood,
  City,
  VotingSite,
}

impl Field {
  /// The header cell written when the table is created.
  pub fn header(self) -> &'static str {
    match self {
      Self::RegisteredAt => "Timestamp",
      Self::RegisteredBy => "SubmittedBy",
      Self::FullName => "FullName",
      Self::NationalId => "NationalId",
      Self::Phone => "Phone",
      Self::Occupation => "Occupation",
      Self::Address => "Address",
      Self::Neighborhood => "Neighborhood",
      Self::City => "City",
      Self::VotingSite => "VotingSite",
    }
  }

  /// Header used by sheets created before the column names were fixed.
  fn legacy_header(self) -> &'static str {
    match self {
      Self::RegisteredAt => "Fecha Registro",
      Self::RegisteredBy => "Registrado Por",
      Self::FullName => "Nombre",
      Self::NationalId => "Cédula",
      Self::Phone => "Teléfono",
      Self::Occupation => "Ocupación",
      Self::Address => "Dirección",
      Self::Neighborhood => "Barrio",
      Self::City => "Ciudad",
      Self::VotingSite => "Puesto votacion",
    }
  }

  /// Resolve a header cell to a field. Surrounding whitespace, case and
  /// accents are ignored; both current and legacy headers are accepted.
  pub fn from_header(cell: &str) -> Option<Self> {
    let folded = fold(cell);
    Self::iter().find(|f| {
      fold(f.header()) == folded || fold(f.legacy_header()) == folded
    })
  }

  /// The full header row in storage order.
  pub fn header_row() -> Vec<String> {
    Self::iter().map(|f| f.header().to_owned()).collect()
  }
}

// ─── CitizenRecord ───────────────────────────────────────────────────────────

/// One registration as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitizenRecord {
  /// Store-assigned; never changes after the row is written.
  pub registered_at: DateTime<Utc>,
  /// Operator the registration is credited to.
  pub registered_by: String,
  pub full_name:     String,
  pub national_id:   String,
  pub phone:         String,
  pub occupation:    String,
  pub address:       String,
  pub neighborhood:  String,
  pub city:          String,
  pub voting_site:   Option<String>,
}

impl CitizenRecord {
  /// String form of a single field, as it appears in its table cell.
  pub fn value(&self, field: Field) -> Cow<'_, str> {
    match field {
      Field::RegisteredAt => {
        Cow::Owned(self.registered_at.format(TIMESTAMP_FORMAT).to_string())
      }
      Field::RegisteredBy => Cow::Borrowed(&self.registered_by),
      Field::FullName => Cow::Borrowed(&self.full_name),
      Field::NationalId => Cow::Borrowed(&self.national_id),
      Field::Phone => Cow::Borrowed(&self.phone),
      Field::Occupation => Cow::Borrowed(&self.occupation),
      Field::Address => Cow::Borrowed(&self.address),
      Field::Neighborhood => Cow::Borrowed(&self.neighborhood),
      Field::City => Cow::Borrowed(&self.city),
      Field::VotingSite => Cow::Borrowed(self.voting_site.as_deref().unwrap_or("")),
    }
  }

  /// Serialise to one table row in fixed column order.
  pub fn to_row(&self) -> Vec<String> {
    Field::iter().map(|f| self.value(f).into_owned()).collect()
  }

  /// Decode a data row given the field each column maps to.
  ///
  /// Missing trailing cells read as empty. `row` is the 1-based row number
  /// used in error messages.
  pub fn from_row(
    columns: &[Option<Field>],
    cells: &[String],
    row: usize,
  ) -> Result<Self> {
    let mut values: [&str; Field::COUNT] = [""; Field::COUNT];
    for (column, field) in columns.iter().enumerate() {
      if let Some(field) = field {
        values[*field as usize] = cells.get(column).map(|c| c.trim()).unwrap_or("");
      }
    }
    let get = |f: Field| values[f as usize].to_owned();

    let registered_at = decode_timestamp(values[Field::RegisteredAt as usize])
      .map_err(|reason| Error::MalformedRow { row, reason })?;
    let voting_site = Some(get(Field::VotingSite)).filter(|s| !s.is_empty());

    Ok(Self {
      registered_at,
      registered_by: get(Field::RegisteredBy),
      full_name: get(Field::FullName),
      national_id: get(Field::NationalId),
      phone: get(Field::Phone),
      occupation: get(Field::Occupation),
      address: get(Field::Address),
      neighborhood: get(Field::Neighborhood),
      city: get(Field::City),
      voting_site,
    })
  }
}

/// Parse a `Timestamp` cell. Accepts the sheet's own format (read as UTC)
/// and RFC 3339.
pub fn decode_timestamp(cell: &str) -> std::result::Result<DateTime<Utc>, String> {
  if cell.is_empty() {
    return Err("empty timestamp".to_owned());
  }
  if let Ok(naive) = NaiveDateTime::parse_from_str(cell, TIMESTAMP_FORMAT) {
    return Ok(naive.and_utc());
  }
  DateTime::parse_from_rfc3339(cell)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| format!("unparseable timestamp {cell:?}: {e}"))
}

// ─── NewRecord ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::RecordStore::append`].
/// `registered_at` and `registered_by` are set by the store.
/// Absent members deserialise as empty and are reported by [`Self::prepare`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewRecord {
  pub full_name:    String,
  pub national_id:  String,
  pub phone:        String,
  pub occupation:   String,
  pub address:      String,
  pub neighborhood: String,
  pub city:         String,
  pub voting_site:  Option<String>,
}

impl NewRecord {
  /// Trim and uppercase the submission, then check it.
  ///
  /// Every field but the voting site is required; `national_id` and `phone`
  /// must be digits only. All failures are reported together.
  pub fn prepare(self) -> Result<Self, ValidationErrors> {
    let upper = |s: String| s.trim().to_uppercase();
    let prepared = Self {
      full_name:    upper(self.full_name),
      national_id:  self.national_id.trim().to_owned(),
      phone:        self.phone.trim().to_owned(),
      occupation:   upper(self.occupation),
      address:      upper(self.address),
      neighborhood: upper(self.neighborhood),
      city:         upper(self.city),
      voting_site:  self.voting_site.map(upper).filter(|s| !s.is_empty()),
    };

    let mut errors = ValidationErrors::default();
    for (field, value) in [
      (Field::FullName, &prepared.full_name),
      (Field::NationalId, &prepared.national_id),
      (Field::Phone, &prepared.phone),
      (Field::Occupation, &prepared.occupation),
      (Field::Address, &prepared.address),
      (Field::Neighborhood, &prepared.neighborhood),
      (Field::City, &prepared.city),
    ] {
      if value.is_empty() {
        errors.push(field, "required");
      }
    }
    for (field, value) in [
      (Field::NationalId, &prepared.national_id),
      (Field::Phone, &prepared.phone),
    ] {
      if !value.is_empty() && !value.chars().all(|c| c.is_ascii_digit()) {
        errors.push(field, "must contain digits only");
      }
    }

    if errors.is_empty() { Ok(prepared) } else { Err(errors) }
  }

  /// Complete the record with the store-assigned fields.
  pub fn into_record(
    self,
    registered_at: DateTime<Utc>,
    registered_by: String,
  ) -> CitizenRecord {
    CitizenRecord {
      registered_at,
      registered_by,
      full_name: self.full_name,
      national_id: self.national_id,
      phone: self.phone,
      occupation: self.occupation,
      address: self.address,
      neighborhood: self.neighborhood,
      city: self.city,
      voting_site: self.voting_site,
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  pub(crate) fn sample() -> NewRecord {
    NewRecord {
      full_name:    " ana maría ruiz ".into(),
      national_id:  " 1115000111 ".into(),
      phone:        "3101234567".into(),
      occupation:   "docente".into(),
      address:      "cra 14 # 5-20".into(),
      neighborhood: "el carmen".into(),
      city:         "buga".into(),
      voting_site:  Some("  ".into()),
    }
  }

  #[test]
  fn prepare_trims_and_uppercases() {
    let r = sample().prepare().unwrap();
    assert_eq!(r.full_name, "ANA MARÍA RUIZ");
    assert_eq!(r.national_id, "1115000111");
    assert_eq!(r.city, "BUGA");
    assert_eq!(r.voting_site, None);
  }

  #[test]
  fn prepare_reports_every_missing_field() {
    let errors = NewRecord::default().prepare().unwrap_err();
    let fields: Vec<Field> = errors.fields().collect();
    assert_eq!(fields.len(), 7);
    assert!(!fields.contains(&Field::VotingSite));
  }

  #[test]
  fn prepare_rejects_non_numeric_id_and_phone() {
    let mut input = sample();
    input.national_id = "11-15".into();
    input.phone = "310 123".into();
    let errors = input.prepare().unwrap_err();
    assert_eq!(
      errors.fields().collect::<Vec<_>>(),
      vec![Field::NationalId, Field::Phone]
    );
  }

  #[test]
  fn header_lookup_accepts_legacy_names() {
    assert_eq!(Field::from_header("  Cédula "), Some(Field::NationalId));
    assert_eq!(Field::from_header("CEDULA"), Some(Field::NationalId));
    assert_eq!(Field::from_header("fecha registro"), Some(Field::RegisteredAt));
    assert_eq!(Field::from_header(" City"), Some(Field::City));
    assert_eq!(Field::from_header("Notes"), None);
  }

  #[test]
  fn row_roundtrip_through_cells() {
    let at = Utc.with_ymd_and_hms(2025, 3, 9, 14, 30, 0).unwrap();
    let record = sample().prepare().unwrap().into_record(at, "fabian".into());
    let row = record.to_row();
    assert_eq!(row[0], "2025-03-09 14:30:00");
    assert_eq!(row.len(), Field::COUNT);

    let columns: Vec<Option<Field>> = Field::iter().map(Some).collect();
    let decoded = CitizenRecord::from_row(&columns, &row, 2).unwrap();
    assert_eq!(decoded, record);
  }

  #[test]
  fn short_rows_pad_with_empty_cells() {
    let columns: Vec<Option<Field>> = Field::iter().map(Some).collect();
    let cells = vec!["2025-03-09 14:30:00".to_owned(), "xammy".to_owned()];
    let decoded = CitizenRecord::from_row(&columns, &cells, 2).unwrap();
    assert_eq!(decoded.registered_by, "xammy");
    assert_eq!(decoded.city, "");
    assert_eq!(decoded.voting_site, None);
  }

  #[test]
  fn bad_timestamp_is_a_malformed_row() {
    let columns = vec![Some(Field::RegisteredAt)];
    let err = CitizenRecord::from_row(&columns, &["ayer".to_owned()], 7).unwrap_err();
    assert!(matches!(err, Error::MalformedRow { row: 7, .. }));
  }

  #[test]
  fn rfc3339_timestamps_are_accepted() {
    let at = decode_timestamp("2025-03-09T14:30:00-05:00").unwrap();
    assert_eq!(at, Utc.with_ymd_and_hms(2025, 3, 9, 19, 30, 0).unwrap());
  }
}
