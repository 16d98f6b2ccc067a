use crate::bridge::BridgeError;

use url::Url;

/// Derive a participant identity from a document location.
///
/// The final path segment is dropped along with query and fragment, so
/// `http://p/app/index.html` becomes `http://p/app` and `http://p/index.html`
/// becomes `http://p`.
pub fn participant_uri(location: &str) -> Result<String, BridgeError> {
	let url = Url::parse(location)
		.map_err(|e| BridgeError::InvalidLocation(format!("{}: {}", location, e)))?;

	let origin = url.origin();
	if !origin.is_tuple() {
		return Err(BridgeError::InvalidLocation(format!(
			"{} has an opaque origin",
			location
		)));
	}

	let mut segments: Vec<&str> = url
		.path_segments()
		.map(|segments| segments.collect())
		.unwrap_or_default();
	segments.pop();
	segments.retain(|segment| !segment.is_empty());

	let mut uri = origin.ascii_serialization();
	for segment in segments {
		uri.push('/');
		uri.push_str(segment);
	}
	Ok(uri)
}
