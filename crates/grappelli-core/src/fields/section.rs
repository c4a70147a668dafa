//! Visual grouping of fields into titled sections
//!
//! Sections are purely presentational: every consumer except the detail
//! layout sees the flattened field list, and key uniqueness is enforced
//! across section boundaries.

use super::Field;

/// One element of a resource's field declaration
#[derive(Debug, Clone)]
pub enum FieldElement {
	Field(Field),
	Section(Section),
}

impl From<Field> for FieldElement {
	fn from(field: Field) -> Self {
		FieldElement::Field(field)
	}
}

impl From<Section> for FieldElement {
	fn from(section: Section) -> Self {
		FieldElement::Section(section)
	}
}

/// A titled group of fields
///
/// # Examples
///
/// ```
/// use grappelli_core::fields::{Field, Section};
///
/// let section = Section::new("Billing")
///     .with_field(Field::text("Street", "street"))
///     .with_field(Field::text("City", "city"))
///     .collapsible();
///
/// assert_eq!(section.fields().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Section {
	title: String,
	fields: Vec<Field>,
	collapsible: bool,
}

impl Section {
	pub fn new(title: impl Into<String>) -> Self {
		Self { title: title.into(), fields: Vec::new(), collapsible: false }
	}

	pub fn with_field(mut self, field: Field) -> Self {
		self.fields.push(field);
		self
	}

	pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
		self.fields.extend(fields);
		self
	}

	pub fn collapsible(mut self) -> Self {
		self.collapsible = true;
		self
	}

	pub fn title(&self) -> &str {
		&self.title
	}

	pub fn fields(&self) -> &[Field] {
		&self.fields
	}

	pub fn is_collapsible(&self) -> bool {
		self.collapsible
	}
}

/// Flatten a field declaration into the linear field list every
/// non-layout consumer operates on, preserving declaration order
pub fn flatten(elements: &[FieldElement]) -> Vec<Field> {
	let mut fields = Vec::new();
	for element in elements {
		match element {
			FieldElement::Field(field) => fields.push(field.clone()),
			FieldElement::Section(section) => fields.extend(section.fields.iter().cloned()),
		}
	}
	fields
}
