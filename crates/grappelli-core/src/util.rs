//! Small string helpers shared across the crate

use sea_query::LikeExpr;

/// Build a contains-style `LIKE` pattern for a user-supplied term, with
/// `%`, `_`, and `\` in the term matched literally.
pub fn like_contains(term: &str) -> LikeExpr {
	let mut escaped = String::with_capacity(term.len());
	for ch in term.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			escaped.push('\\');
		}
		escaped.push(ch);
	}
	LikeExpr::new(format!("%{escaped}%")).escape('\\')
}

/// Convert a CamelCase / PascalCase name to kebab-case.
///
/// # Examples
///
/// ```
/// use grappelli_core::util::kebab_case;
///
/// assert_eq!(kebab_case("BlogPost"), "blog-post");
/// assert_eq!(kebab_case("UserResource"), "user-resource");
/// assert_eq!(kebab_case("user"), "user");
/// ```
pub fn kebab_case(name: &str) -> String {
	let mut out = String::with_capacity(name.len() + 4);
	for (i, ch) in name.chars().enumerate() {
		if ch.is_ascii_uppercase() {
			if i > 0 {
				out.push('-');
			}
			out.push(ch.to_ascii_lowercase());
		} else if ch == '_' || ch == ' ' {
			out.push('-');
		} else {
			out.push(ch);
		}
	}
	out
}

/// Pluralize an English word the way URI keys need it.
///
/// Handles the common suffix classes only; this is a slug helper, not a
/// linguistics library.
///
/// # Examples
///
/// ```
/// use grappelli_core::util::pluralize;
///
/// assert_eq!(pluralize("user"), "users");
/// assert_eq!(pluralize("category"), "categories");
/// assert_eq!(pluralize("box"), "boxes");
/// assert_eq!(pluralize("day"), "days");
/// ```
pub fn pluralize(word: &str) -> String {
	if word.is_empty() {
		return String::new();
	}
	let lower = word.to_ascii_lowercase();
	if let Some(stem) = lower.strip_suffix('y') {
		let before = stem.chars().last();
		if !matches!(before, Some('a' | 'e' | 'i' | 'o' | 'u')) {
			return format!("{}ies", &word[..word.len() - 1]);
		}
	}
	if lower.ends_with('s')
		|| lower.ends_with('x')
		|| lower.ends_with('z')
		|| lower.ends_with("ch")
		|| lower.ends_with("sh")
	{
		return format!("{word}es");
	}
	format!("{word}s")
}

/// Derive a resource's URI key from its type name.
///
/// Kebab-cases the name, collapses a trailing `-resource` segment, and
/// pluralizes the final word.
///
/// # Examples
///
/// ```
/// use grappelli_core::util::uri_key_for;
///
/// assert_eq!(uri_key_for("UserResource"), "users");
/// assert_eq!(uri_key_for("BlogPostResource"), "blog-posts");
/// assert_eq!(uri_key_for("Category"), "categories");
/// ```
pub fn uri_key_for(name: &str) -> String {
	let kebab = kebab_case(name);
	let base = kebab.strip_suffix("-resource").unwrap_or(&kebab);
	match base.rsplit_once('-') {
		Some((head, last)) => format!("{}-{}", head, pluralize(last)),
		None => pluralize(base),
	}
}
