//! The field DSL
//!
//! A [`Field`] declares one model attribute or relation: type, label,
//! per-view visibility, validation contract, default-value strategy,
//! dependency rules, and relation metadata. Fields are built fluently
//! inside a resource's `fields()` declaration, once per request, and are
//! treated as immutable afterwards.

mod dependency;
mod relation;
mod section;

pub use dependency::{extract_formula_fields, ConditionKind, DependencyConfig};
pub use relation::{MorphTarget, RelationConfig, RelationKind};
pub use section::{flatten, FieldElement, Section};

use grappelli_types::{AdminError, AdminResult, FieldDescriptor, Operator, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The four view contexts a field can appear in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
	Index,
	Detail,
	Creation,
	Update,
}

/// Context handed to field callbacks and `fields()` declarations
///
/// Callbacks must be pure given this context; that keeps descriptor
/// serialization idempotent.
#[derive(Debug, Clone, Default)]
pub struct FieldContext {
	/// View being rendered, when known
	pub view: Option<View>,
	/// Record in scope, when resolving against an existing row
	pub record: Option<Record>,
}

impl FieldContext {
	/// Context with no view or record (metadata listings)
	pub fn empty() -> Self {
		Self::default()
	}

	/// Context for one view with no record
	pub fn for_view(view: View) -> Self {
		Self { view: Some(view), record: None }
	}

	/// Context for one view over one record
	pub fn with_record(view: View, record: Record) -> Self {
		Self { view: Some(view), record: Some(record) }
	}

	/// Value of an attribute on the record in scope
	pub fn value(&self, attribute: &str) -> Option<&Value> {
		self.record.as_ref().and_then(|r| r.get(attribute))
	}
}

/// Field type, driving the default frontend component and the shape of
/// auto-derived filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
	Text,
	Textarea,
	Password,
	Number,
	Toggle,
	Date,
	DateTime,
	Select,
	Json,
	Hidden,
	Computed,
	BelongsTo,
	HasMany,
	BelongsToMany,
	MorphTo,
	MorphToMany,
}

impl FieldType {
	/// Transport name of the type
	pub fn name(&self) -> &'static str {
		match self {
			FieldType::Text => "text",
			FieldType::Textarea => "textarea",
			FieldType::Password => "password",
			FieldType::Number => "number",
			FieldType::Toggle => "toggle",
			FieldType::Date => "date",
			FieldType::DateTime => "datetime",
			FieldType::Select => "select",
			FieldType::Json => "json",
			FieldType::Hidden => "hidden",
			FieldType::Computed => "computed",
			FieldType::BelongsTo => "belongs_to",
			FieldType::HasMany => "has_many",
			FieldType::BelongsToMany => "belongs_to_many",
			FieldType::MorphTo => "morph_to",
			FieldType::MorphToMany => "morph_to_many",
		}
	}

	/// Default frontend component hint (opaque to core logic)
	pub fn default_component(&self) -> &'static str {
		match self {
			FieldType::Text => "text-input",
			FieldType::Textarea => "textarea-input",
			FieldType::Password => "password-input",
			FieldType::Number => "number-input",
			FieldType::Toggle => "toggle-input",
			FieldType::Date => "date-picker",
			FieldType::DateTime => "datetime-picker",
			FieldType::Select => "select-input",
			FieldType::Json => "json-editor",
			FieldType::Hidden => "hidden-input",
			FieldType::Computed => "computed-display",
			FieldType::BelongsTo => "belongs-to-select",
			FieldType::HasMany => "has-many-panel",
			FieldType::BelongsToMany => "belongs-to-many-select",
			FieldType::MorphTo => "morph-to-select",
			FieldType::MorphToMany => "morph-to-many-select",
		}
	}
}

/// A validation rule carried by a field
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
	Required,
	Email,
	Numeric,
	Boolean,
	/// Maximum string length / numeric value
	Max(i64),
	/// Minimum string length / numeric value
	Min(i64),
	/// Value must be one of the given options
	In(Vec<String>),
	/// Opaque rule forwarded to the client untouched
	Custom(String),
}

impl Rule {
	/// Transport form (`"required"`, `"max:255"`, `"in:a,b"`)
	pub fn to_transport(&self) -> String {
		match self {
			Rule::Required => "required".into(),
			Rule::Email => "email".into(),
			Rule::Numeric => "numeric".into(),
			Rule::Boolean => "boolean".into(),
			Rule::Max(n) => format!("max:{n}"),
			Rule::Min(n) => format!("min:{n}"),
			Rule::In(options) => format!("in:{}", options.join(",")),
			Rule::Custom(raw) => raw.clone(),
		}
	}

	/// Check a submitted value; `None` means the rule passes.
	///
	/// Non-required rules pass on absent/null input so that optional
	/// fields may be omitted from mutations.
	pub fn validate(&self, label: &str, value: Option<&Value>) -> Option<String> {
		let present = matches!(value, Some(v) if !v.is_null());
		if let Rule::Required = self {
			let empty_string = matches!(value, Some(Value::String(s)) if s.is_empty());
			if !present || empty_string {
				return Some(format!("The {label} field is required"));
			}
			return None;
		}
		if !present {
			return None;
		}
		let value = value.expect("checked present above");
		match self {
			Rule::Required => None,
			Rule::Email => match value.as_str() {
				Some(s) if s.contains('@') && s.contains('.') => None,
				_ => Some(format!("The {label} field must be a valid email address")),
			},
			Rule::Numeric => {
				let numeric = value.is_number()
					|| value.as_str().is_some_and(|s| s.parse::<f64>().is_ok());
				if numeric {
					None
				} else {
					Some(format!("The {label} field must be a number"))
				}
			}
			Rule::Boolean => {
				if value.is_boolean() {
					None
				} else {
					Some(format!("The {label} field must be true or false"))
				}
			}
			Rule::Max(limit) => {
				let over = match value {
					Value::String(s) => s.chars().count() as i64 > *limit,
					Value::Number(n) => n.as_f64().is_some_and(|f| f > *limit as f64),
					_ => false,
				};
				if over {
					Some(format!("The {label} field may not be greater than {limit}"))
				} else {
					None
				}
			}
			Rule::Min(limit) => {
				let under = match value {
					Value::String(s) => (s.chars().count() as i64) < *limit,
					Value::Number(n) => n.as_f64().is_some_and(|f| f < *limit as f64),
					_ => false,
				};
				if under {
					Some(format!("The {label} field must be at least {limit}"))
				} else {
					None
				}
			}
			Rule::In(options) => {
				let text = match value {
					Value::String(s) => s.clone(),
					other => other.to_string(),
				};
				if options.iter().any(|o| o == &text) {
					None
				} else {
					Some(format!("The selected {label} is invalid"))
				}
			}
			Rule::Custom(_) => None,
		}
	}
}

/// Boolean callback over a field context
pub type VisibilityCallback = Arc<dyn Fn(&FieldContext) -> bool + Send + Sync>;
/// Value-producing callback over a field context
pub type ValueCallback = Arc<dyn Fn(&FieldContext) -> Value + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct ViewFlags {
	index: bool,
	detail: bool,
	creation: bool,
	update: bool,
}

impl Default for ViewFlags {
	fn default() -> Self {
		Self { index: true, detail: true, creation: true, update: true }
	}
}

/// Declarative metadata unit describing one model attribute or relation
///
/// # Examples
///
/// ```
/// use grappelli_core::fields::{Field, Rule, View};
///
/// let field = Field::text("Name", "name")
///     .with_rules(vec![Rule::Required, Rule::Max(255)])
///     .sortable()
///     .filterable();
///
/// assert_eq!(field.key(), "name");
/// assert!(field.is_required());
/// ```
#[derive(Clone)]
pub struct Field {
	label: String,
	attribute: String,
	key: Option<String>,
	field_type: FieldType,
	component: Option<String>,
	visible: ViewFlags,
	show_when: Option<VisibilityCallback>,
	hide_when: Option<VisibilityCallback>,
	readonly: bool,
	disabled: bool,
	sortable: bool,
	filterable: bool,
	apply_in_index_query: bool,
	rules: Vec<Rule>,
	default_value: Option<Value>,
	default_callback: Option<ValueCallback>,
	default_from_attribute: Option<String>,
	default_condition: Option<VisibilityCallback>,
	dependency: Option<DependencyConfig>,
	relation: Option<RelationConfig>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("label", &self.label)
			.field("attribute", &self.attribute)
			.field("key", &self.key())
			.field("type", &self.field_type.name())
			.finish()
	}
}

impl Field {
	fn base(label: impl Into<String>, attribute: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			label: label.into(),
			attribute: attribute.into(),
			key: None,
			field_type,
			component: None,
			visible: ViewFlags::default(),
			show_when: None,
			hide_when: None,
			readonly: false,
			disabled: false,
			sortable: false,
			filterable: false,
			apply_in_index_query: true,
			rules: Vec::new(),
			default_value: None,
			default_callback: None,
			default_from_attribute: None,
			default_condition: None,
			dependency: None,
			relation: None,
		}
	}

	/// Plain text field
	pub fn text(label: impl Into<String>, attribute: impl Into<String>) -> Self {
		Self::base(label, attribute, FieldType::Text)
	}

	/// Multi-line text field
	pub fn textarea(label: impl Into<String>, attribute: impl Into<String>) -> Self {
		Self::base(label, attribute, FieldType::Textarea)
	}

	/// Password field, hidden from index and detail by default
	pub fn password(label: impl Into<String>, attribute: impl Into<String>) -> Self {
		let mut field = Self::base(label, attribute, FieldType::Password);
		field.visible.index = false;
		field.visible.detail = false;
		field
	}

	/// Numeric field
	pub fn number(label: impl Into<String>, attribute: impl Into<String>) -> Self {
		Self::base(label, attribute, FieldType::Number)
	}

	/// Boolean toggle field
	pub fn toggle(label: impl Into<String>, attribute: impl Into<String>) -> Self {
		Self::base(label, attribute, FieldType::Toggle)
	}

	/// Date field
	pub fn date(label: impl Into<String>, attribute: impl Into<String>) -> Self {
		Self::base(label, attribute, FieldType::Date)
	}

	/// Date-time field
	pub fn datetime(label: impl Into<String>, attribute: impl Into<String>) -> Self {
		Self::base(label, attribute, FieldType::DateTime)
	}

	/// Select field
	pub fn select(label: impl Into<String>, attribute: impl Into<String>) -> Self {
		Self::base(label, attribute, FieldType::Select)
	}

	/// JSON blob field
	pub fn json(label: impl Into<String>, attribute: impl Into<String>) -> Self {
		Self::base(label, attribute, FieldType::Json)
	}

	/// Hidden field (forms only)
	pub fn hidden(label: impl Into<String>, attribute: impl Into<String>) -> Self {
		let mut field = Self::base(label, attribute, FieldType::Hidden);
		field.visible.index = false;
		field.visible.detail = false;
		field
	}

	/// Computed field: no storage column, value produced by a callback
	pub fn computed(label: impl Into<String>, key: impl Into<String>, callback: ValueCallback) -> Self {
		let key = key.into();
		let mut field = Self::base(label, key.clone(), FieldType::Computed);
		field.key = Some(key);
		field.apply_in_index_query = false;
		field.readonly = true;
		field.default_callback = Some(callback);
		field
	}

	/// Belongs-to relation field; the storage attribute is the foreign
	/// key, the API key is the relation name
	pub fn belongs_to(label: impl Into<String>, relation_name: impl Into<String>) -> Self {
		let name = relation_name.into();
		let relation = RelationConfig::new(RelationKind::BelongsTo, name.clone());
		let mut field = Self::base(label, relation.foreign_key_column(), FieldType::BelongsTo);
		field.key = Some(name);
		field.relation = Some(relation);
		field
	}

	/// Has-many relation field (no storage column on the parent)
	pub fn has_many(label: impl Into<String>, relation_name: impl Into<String>) -> Self {
		let name = relation_name.into();
		let mut field = Self::base(label, name.clone(), FieldType::HasMany);
		field.key = Some(name.clone());
		field.relation = Some(RelationConfig::new(RelationKind::HasMany, name));
		field.apply_in_index_query = false;
		field.visible.index = false;
		field
	}

	/// Belongs-to-many relation field managed through a pivot table
	pub fn belongs_to_many(label: impl Into<String>, relation_name: impl Into<String>) -> Self {
		let name = relation_name.into();
		let mut field = Self::base(label, name.clone(), FieldType::BelongsToMany);
		field.key = Some(name.clone());
		field.relation = Some(RelationConfig::new(RelationKind::BelongsToMany, name));
		field.apply_in_index_query = false;
		field
	}

	/// Polymorphic belongs-to field; the storage attributes are the morph
	/// type/id pair
	pub fn morph_to(label: impl Into<String>, relation_name: impl Into<String>) -> Self {
		let name = relation_name.into();
		let relation = RelationConfig::new(RelationKind::MorphTo, name.clone());
		let id_attribute = relation
			.morph_id_attribute
			.clone()
			.expect("morph-to always derives its id attribute");
		let mut field = Self::base(label, id_attribute, FieldType::MorphTo);
		field.key = Some(name);
		field.relation = Some(relation);
		field
	}

	/// Polymorphic many-to-many field
	pub fn morph_to_many(label: impl Into<String>, relation_name: impl Into<String>) -> Self {
		let name = relation_name.into();
		let mut field = Self::base(label, name.clone(), FieldType::MorphToMany);
		field.key = Some(name.clone());
		field.relation = Some(RelationConfig::new(RelationKind::MorphToMany, name));
		field.apply_in_index_query = false;
		field
	}

	// ---- accessors ----

	/// API key: unique within a resource's flattened field list
	pub fn key(&self) -> &str {
		self.key.as_deref().unwrap_or(&self.attribute)
	}

	/// Display label
	pub fn label(&self) -> &str {
		&self.label
	}

	/// Storage attribute
	pub fn attribute(&self) -> &str {
		&self.attribute
	}

	/// Field type
	pub fn field_type(&self) -> FieldType {
		self.field_type
	}

	/// Frontend component hint
	pub fn component(&self) -> String {
		self.component
			.clone()
			.unwrap_or_else(|| self.field_type.default_component().to_string())
	}

	/// Relation configuration, when this is a relation field
	pub fn relation(&self) -> Option<&RelationConfig> {
		self.relation.as_ref()
	}

	/// Whether the field carries a `Required` rule
	pub fn is_required(&self) -> bool {
		self.rules.iter().any(|r| matches!(r, Rule::Required))
	}

	/// Whether the field is readonly
	pub fn is_readonly(&self) -> bool {
		self.readonly
	}

	/// Whether the index may sort by this field
	pub fn is_sortable(&self) -> bool {
		self.sortable
	}

	/// Whether a filter is auto-derived for this field
	pub fn is_filterable(&self) -> bool {
		self.filterable
	}

	/// Whether the field's column joins the optimized index select
	pub fn applies_in_index_query(&self) -> bool {
		self.apply_in_index_query
	}

	/// Declared validation rules
	pub fn rules(&self) -> &[Rule] {
		&self.rules
	}

	// ---- builder: shape ----

	/// Override the API key
	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	/// Override the frontend component hint
	pub fn with_component(mut self, component: impl Into<String>) -> Self {
		self.component = Some(component.into());
		self
	}

	/// Replace the validation rule set
	pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
		self.rules = rules;
		self
	}

	/// Add a `Required` rule
	pub fn required(mut self) -> Self {
		if !self.is_required() {
			self.rules.insert(0, Rule::Required);
		}
		self
	}

	/// Mark readonly (excluded from fillable extraction)
	pub fn readonly(mut self) -> Self {
		self.readonly = true;
		self
	}

	/// Mark disabled
	pub fn disabled(mut self) -> Self {
		self.disabled = true;
		self
	}

	/// Allow index sorting by this field
	pub fn sortable(mut self) -> Self {
		self.sortable = true;
		self
	}

	/// Auto-derive an index filter for this field
	pub fn filterable(mut self) -> Self {
		self.filterable = true;
		self
	}

	/// Keep this field's column out of the optimized index select
	pub fn exclude_from_index_query(mut self) -> Self {
		self.apply_in_index_query = false;
		self
	}

	// ---- builder: visibility ----

	/// Hide from the index listing
	pub fn hide_on_index(mut self) -> Self {
		self.visible.index = false;
		self
	}

	/// Hide from the detail view
	pub fn hide_on_detail(mut self) -> Self {
		self.visible.detail = false;
		self
	}

	/// Hide from the creation form
	pub fn hide_on_creation(mut self) -> Self {
		self.visible.creation = false;
		self
	}

	/// Hide from the update form
	pub fn hide_on_update(mut self) -> Self {
		self.visible.update = false;
		self
	}

	/// Show only on forms (creation and update)
	pub fn only_on_forms(mut self) -> Self {
		self.visible = ViewFlags { index: false, detail: false, creation: true, update: true };
		self
	}

	/// Show only on the index
	pub fn only_on_index(mut self) -> Self {
		self.visible = ViewFlags { index: true, detail: false, creation: false, update: false };
		self
	}

	/// Show only on the detail view
	pub fn only_on_detail(mut self) -> Self {
		self.visible = ViewFlags { index: false, detail: true, creation: false, update: false };
		self
	}

	/// Conditionally show: hidden whenever the callback returns false
	pub fn show_when(mut self, callback: VisibilityCallback) -> Self {
		self.show_when = Some(callback);
		self
	}

	/// Unconditionally hide whenever the callback returns true; takes
	/// precedence over `show_when` and the static flags
	pub fn hide_when(mut self, callback: VisibilityCallback) -> Self {
		self.hide_when = Some(callback);
		self
	}

	/// Resolve visibility for one view context.
	///
	/// Order is fixed: `hide_when` wins, then `show_when`, then the
	/// static per-view flag. The first failing check hides the field and
	/// no further checks run.
	pub fn visible_in(&self, view: View, ctx: &FieldContext) -> bool {
		if let Some(hide) = &self.hide_when {
			if hide(ctx) {
				return false;
			}
		}
		if let Some(show) = &self.show_when {
			if !show(ctx) {
				return false;
			}
		}
		match view {
			View::Index => self.visible.index,
			View::Detail => self.visible.detail,
			View::Creation => self.visible.creation,
			View::Update => self.visible.update,
		}
	}

	// ---- builder: defaults ----

	/// Static default value
	pub fn default_value(mut self, value: Value) -> Self {
		self.default_value = Some(value);
		self
	}

	/// Default produced by a callback
	pub fn default_callback(mut self, callback: ValueCallback) -> Self {
		self.default_callback = Some(callback);
		self
	}

	/// Default copied from a sibling attribute
	pub fn default_from_attribute(mut self, attribute: impl Into<String>) -> Self {
		self.default_from_attribute = Some(attribute.into());
		self
	}

	/// Gate default resolution behind a condition; when the condition
	/// returns false no default applies at all
	pub fn default_when(mut self, condition: VisibilityCallback) -> Self {
		self.default_condition = Some(condition);
		self
	}

	/// Resolve this field's value against a record.
	///
	/// Strict-null semantics: a present non-null attribute always wins,
	/// including falsy values like `0`, `false`, and `""`. Defaults are
	/// consulted only for missing or null attributes, in fixed priority:
	/// condition gate, then sibling-attribute copy, then callback, then
	/// static value. A missing attribute never errors; the result is
	/// `null` when nothing applies.
	pub fn resolve(&self, ctx: &FieldContext) -> Value {
		if let Some(value) = ctx.value(&self.attribute) {
			if !value.is_null() {
				return value.clone();
			}
		}
		if let Some(condition) = &self.default_condition {
			if !condition(ctx) {
				return Value::Null;
			}
		}
		if let Some(attribute) = &self.default_from_attribute {
			if let Some(value) = ctx.value(attribute) {
				if !value.is_null() {
					return value.clone();
				}
			}
		}
		if let Some(callback) = &self.default_callback {
			return callback(ctx);
		}
		if let Some(value) = &self.default_value {
			return value.clone();
		}
		Value::Null
	}

	// ---- builder: relation tweaks ----

	fn relation_mut(&mut self) -> &mut RelationConfig {
		self.relation
			.as_mut()
			.expect("relation builder methods require a relation field constructor")
	}

	/// Set the related storage table
	pub fn related_table(mut self, table: impl Into<String>) -> Self {
		self.relation_mut().related_table = Some(table.into());
		self
	}

	/// Bind the related registered resource by uri key
	pub fn related_resource(mut self, key: impl Into<String>) -> Self {
		self.relation_mut().related_resource = Some(key.into());
		self
	}

	/// Override the foreign key column
	pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
		let column = column.into();
		self.relation_mut().foreign_key = Some(column.clone());
		if matches!(self.field_type, FieldType::BelongsTo) {
			self.attribute = column;
		}
		self
	}

	/// Column used as the display label for options and eager loads
	pub fn display_using(mut self, attribute: impl Into<String>) -> Self {
		self.relation_mut().display_attribute = Some(attribute.into());
		self
	}

	/// Constrain the columns eager-loaded for the index
	pub fn related_columns(mut self, columns: Vec<impl Into<String>>) -> Self {
		self.relation_mut().related_columns = columns.into_iter().map(Into::into).collect();
		self
	}

	/// Configure the pivot table for many-to-many kinds
	pub fn pivot(
		mut self,
		table: impl Into<String>,
		foreign_key: impl Into<String>,
		related_key: impl Into<String>,
	) -> Self {
		let relation = self.relation_mut();
		relation.pivot_table = Some(table.into());
		relation.pivot_foreign_key = Some(foreign_key.into());
		relation.pivot_related_key = Some(related_key.into());
		self
	}

	/// Expose extra pivot columns alongside attached rows
	pub fn pivot_columns(mut self, columns: Vec<impl Into<String>>) -> Self {
		self.relation_mut().pivot_columns = columns.into_iter().map(Into::into).collect();
		self
	}

	/// Fetch this relation through its own paginated endpoint and keep it
	/// out of index eager loading
	pub fn paginated(mut self) -> Self {
		self.relation_mut().paginated = true;
		self
	}

	/// Register one selectable target of a morph relation
	pub fn morph_target(
		mut self,
		alias: impl Into<String>,
		table: impl Into<String>,
		resource_key: Option<String>,
		label: impl Into<String>,
	) -> Self {
		self.relation_mut().morph_targets.insert(
			alias.into(),
			MorphTarget { table: table.into(), resource_key, label: label.into() },
		);
		self
	}

	// ---- builder: dependencies ----

	fn dependency_mut(&mut self) -> &mut DependencyConfig {
		self.dependency.get_or_insert_with(DependencyConfig::default)
	}

	/// Declared dependency configuration, if any was registered
	pub fn dependency(&self) -> Option<&DependencyConfig> {
		self.dependency.as_ref()
	}

	/// Serialized dependency configuration; empty when no dependency
	/// method was ever called
	pub fn dependency_descriptor(&self) -> grappelli_types::DependencyDescriptor {
		self.dependency.as_ref().map(DependencyConfig::descriptor).unwrap_or_default()
	}

	/// Observe sibling fields without attaching conditions
	pub fn depends_on(mut self, fields: Vec<impl Into<String>>) -> Self {
		let config = self.dependency_mut();
		for field in fields {
			config.observe(&field.into());
		}
		self
	}

	/// Generic condition registration
	pub fn when_condition(
		mut self,
		kind: ConditionKind,
		field: impl Into<String>,
		operator: Operator,
		value: Option<Value>,
	) -> Self {
		self.dependency_mut().add_condition(kind, &field.into(), operator, value);
		self
	}

	/// Visible only while `field == value`
	pub fn show_when_equals(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.when_condition(ConditionKind::Visibility, field, Operator::Equals, Some(value.into()))
	}

	/// Visible only while `field != value`
	pub fn show_when_not_equals(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.when_condition(ConditionKind::Visibility, field, Operator::NotEquals, Some(value.into()))
	}

	/// Visible only while `field` is truthy
	pub fn show_when_truthy(self, field: impl Into<String>) -> Self {
		self.when_condition(ConditionKind::Visibility, field, Operator::IsTruthy, None)
	}

	/// Visible only while `field` is falsy
	pub fn show_when_falsy(self, field: impl Into<String>) -> Self {
		self.when_condition(ConditionKind::Visibility, field, Operator::IsFalsy, None)
	}

	/// Visible only while `field` has a value
	pub fn show_when_has_value(self, field: impl Into<String>) -> Self {
		self.when_condition(ConditionKind::Visibility, field, Operator::HasValue, None)
	}

	/// Visible only while `field` is one of `values`
	pub fn show_when_in(self, field: impl Into<String>, values: Vec<Value>) -> Self {
		self.when_condition(ConditionKind::Visibility, field, Operator::In, Some(Value::Array(values)))
	}

	/// Disabled while `field == value`
	pub fn disable_when_equals(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.when_condition(ConditionKind::Disabled, field, Operator::Equals, Some(value.into()))
	}

	/// Disabled while `field` is truthy
	pub fn disable_when_truthy(self, field: impl Into<String>) -> Self {
		self.when_condition(ConditionKind::Disabled, field, Operator::IsTruthy, None)
	}

	/// Disabled while `field` has a value
	pub fn disable_when_has_value(self, field: impl Into<String>) -> Self {
		self.when_condition(ConditionKind::Disabled, field, Operator::HasValue, None)
	}

	/// Required while `field == value` (declarative only; not linked to
	/// server-side validation rules)
	pub fn required_when_equals(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.when_condition(ConditionKind::Required, field, Operator::Equals, Some(value.into()))
	}

	/// Required while `field` is truthy (declarative only)
	pub fn required_when_truthy(self, field: impl Into<String>) -> Self {
		self.when_condition(ConditionKind::Required, field, Operator::IsTruthy, None)
	}

	/// Required while `field` has a value (declarative only)
	pub fn required_when_has_value(self, field: impl Into<String>) -> Self {
		self.when_condition(ConditionKind::Required, field, Operator::HasValue, None)
	}

	/// Reload this field's options from `endpoint` whenever `field`
	/// changes, passing the observed value as a request parameter
	pub fn cascade_from(mut self, field: impl Into<String>, endpoint: impl Into<String>) -> Self {
		let field = field.into();
		let mut params = BTreeMap::new();
		params.insert(field.clone(), field);
		self.dependency_mut().set_options(&endpoint.into(), params);
		self
	}

	/// Compute this field's value client-side from a formula over sibling
	/// field keys
	pub fn compute_using(mut self, formula: impl Into<String>) -> Self {
		self.dependency_mut().set_compute(&formula.into());
		self
	}

	/// Clear this field's value when an observed field changes
	pub fn clear_on_change(mut self) -> Self {
		self.dependency_mut().set_clear_on_change(true);
		self
	}

	/// Debounce reactions to observed changes
	pub fn debounce(mut self, milliseconds: u64) -> Self {
		self.dependency_mut().set_debounce(milliseconds);
		self
	}

	// ---- serialization & validation ----

	/// Serialize into the transport descriptor for one view.
	///
	/// Pure given identical inputs: calling it twice without intervening
	/// mutation yields identical output.
	pub fn to_descriptor(&self, ctx: &FieldContext) -> FieldDescriptor {
		let dependency = self.dependency_descriptor();
		FieldDescriptor {
			label: self.label.clone(),
			attribute: self.attribute.clone(),
			key: self.key().to_string(),
			field_type: self.field_type.name().to_string(),
			component: self.component(),
			rules: self.rules.iter().map(Rule::to_transport).collect(),
			required: self.is_required(),
			readonly: self.readonly,
			sortable: self.sortable,
			show_on_index: self.visible.index,
			show_on_detail: self.visible.detail,
			show_on_creation: self.visible.creation,
			show_on_update: self.visible.update,
			value: ctx.record.as_ref().map(|_| self.resolve(ctx)),
			dependency: if dependency.is_empty() { None } else { Some(dependency) },
		}
	}

	/// Validate a submitted value against the declared rules, collecting
	/// every failure message
	pub fn validate(&self, value: Option<&Value>) -> Vec<String> {
		self.rules
			.iter()
			.filter_map(|rule| rule.validate(&self.label, value))
			.collect()
	}
}

/// Enforce key uniqueness over a flattened field list.
///
/// Sections are transparent containers, so uniqueness is checked after
/// flattening.
pub fn ensure_unique_keys(fields: &[Field]) -> AdminResult<()> {
	let mut seen: Vec<&str> = Vec::with_capacity(fields.len());
	for field in fields {
		let key = field.key();
		if seen.contains(&key) {
			return Err(AdminError::Registration(format!(
				"duplicate field key '{key}' in field list"
			)));
		}
		seen.push(key);
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(pairs: &[(&str, Value)]) -> Record {
		pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
	}

	#[test]
	fn key_falls_back_to_attribute() {
		let field = Field::text("Name", "name");
		assert_eq!(field.key(), "name");

		let field = Field::text("Name", "name").with_key("display_name");
		assert_eq!(field.key(), "display_name");
	}

	#[test]
	fn belongs_to_stores_through_the_foreign_key() {
		let field = Field::belongs_to("Author", "author");
		assert_eq!(field.attribute(), "author_id");
		assert_eq!(field.key(), "author");
	}

	#[test]
	fn hide_when_wins_over_show_when_and_static_flags() {
		let field = Field::text("Name", "name")
			.show_when(Arc::new(|_| true))
			.hide_when(Arc::new(|_| true));
		let ctx = FieldContext::for_view(View::Index);

		assert!(!field.visible_in(View::Index, &ctx));
	}

	#[test]
	fn show_when_false_hides_despite_static_flag() {
		let field = Field::text("Name", "name").show_when(Arc::new(|_| false));
		let ctx = FieldContext::for_view(View::Detail);

		assert!(!field.visible_in(View::Detail, &ctx));
	}

	#[test]
	fn static_flags_apply_when_no_callbacks_interfere() {
		let field = Field::text("Name", "name").hide_on_index();
		let ctx = FieldContext::empty();

		assert!(!field.visible_in(View::Index, &ctx));
		assert!(field.visible_in(View::Detail, &ctx));
	}

	#[test]
	fn resolve_keeps_falsy_but_present_values() {
		let field = Field::number("Count", "count").default_value(serde_json::json!(10));
		let ctx = FieldContext {
			view: Some(View::Detail),
			record: Some(record(&[("count", serde_json::json!(0))])),
		};

		assert_eq!(field.resolve(&ctx), serde_json::json!(0));
	}

	#[test]
	fn resolve_applies_default_for_missing_and_null() {
		let field = Field::number("Count", "count").default_value(serde_json::json!(10));

		let missing = FieldContext { view: None, record: Some(record(&[])) };
		assert_eq!(field.resolve(&missing), serde_json::json!(10));

		let null = FieldContext {
			view: None,
			record: Some(record(&[("count", Value::Null)])),
		};
		assert_eq!(field.resolve(&null), serde_json::json!(10));
	}

	#[test]
	fn false_default_condition_yields_null_not_the_plain_default() {
		let field = Field::number("Count", "count")
			.default_when(Arc::new(|_| false))
			.default_value(serde_json::json!(10));
		let ctx = FieldContext { view: None, record: Some(record(&[])) };

		assert_eq!(field.resolve(&ctx), Value::Null);
	}

	#[test]
	fn default_priority_prefers_attribute_copy_over_callback_and_static() {
		let field = Field::text("Slug", "slug")
			.default_from_attribute("name")
			.default_callback(Arc::new(|_| serde_json::json!("from-callback")))
			.default_value(serde_json::json!("static"));
		let ctx = FieldContext {
			view: None,
			record: Some(record(&[("name", serde_json::json!("from-name"))])),
		};

		assert_eq!(field.resolve(&ctx), serde_json::json!("from-name"));
	}

	#[test]
	fn descriptor_is_idempotent() {
		let field = Field::text("Name", "name")
			.required()
			.show_when_equals("type", "special")
			.sortable();
		let ctx = FieldContext::with_record(
			View::Detail,
			record(&[("name", serde_json::json!("Alice"))]),
		);

		let first = field.to_descriptor(&ctx);
		let second = field.to_descriptor(&ctx);
		assert_eq!(first, second);
	}

	#[test]
	fn descriptor_omits_dependency_when_never_registered() {
		let field = Field::text("Name", "name");
		let descriptor = field.to_descriptor(&FieldContext::empty());

		assert!(descriptor.dependency.is_none());
		assert!(field.dependency_descriptor().is_empty());
	}

	#[test]
	fn dependency_methods_register_in_declaration_order() {
		let field = Field::text("Extra", "extra")
			.show_when_equals("type", "special")
			.disable_when_truthy("is_locked")
			.required_when_has_value("parent_id");

		let descriptor = field.dependency_descriptor();
		assert_eq!(
			descriptor.fields,
			vec!["type".to_string(), "is_locked".to_string(), "parent_id".to_string()]
		);
		assert_eq!(descriptor.visibility.len(), 1);
		assert_eq!(descriptor.disabled.len(), 1);
		assert_eq!(descriptor.required.len(), 1);
	}

	#[test]
	fn compute_using_observes_extracted_fields() {
		let field = Field::number("Total", "total").compute_using("round(price * quantity)");
		let descriptor = field.dependency_descriptor();

		assert_eq!(descriptor.fields, vec!["price".to_string(), "quantity".to_string()]);
		assert_eq!(descriptor.compute.as_deref(), Some("round(price * quantity)"));
	}

	#[test]
	fn required_rule_rejects_missing_null_and_empty() {
		let field = Field::text("Name", "name").required();

		assert_eq!(field.validate(None).len(), 1);
		assert_eq!(field.validate(Some(&Value::Null)).len(), 1);
		assert_eq!(field.validate(Some(&serde_json::json!(""))).len(), 1);
		assert!(field.validate(Some(&serde_json::json!("ok"))).is_empty());
	}

	#[test]
	fn non_required_rules_pass_on_absent_values() {
		let field = Field::text("Email", "email").with_rules(vec![Rule::Email, Rule::Max(64)]);
		assert!(field.validate(None).is_empty());
		assert_eq!(field.validate(Some(&serde_json::json!("not-an-email"))).len(), 1);
	}

	#[test]
	fn duplicate_keys_are_rejected() {
		let fields = vec![Field::text("A", "name"), Field::text("B", "other").with_key("name")];
		assert!(ensure_unique_keys(&fields).is_err());

		let fields = vec![Field::text("A", "name"), Field::text("B", "other")];
		assert!(ensure_unique_keys(&fields).is_ok());
	}
}
