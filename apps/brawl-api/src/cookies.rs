//! Client filter state carried in two plain cookies holding percent-encoded JSON.

use std::borrow::Cow;

use axum::http::{
	HeaderMap, HeaderName,
	header::{COOKIE, SET_COOKIE},
};

use brawl_domain::client_state::{BRAWLERS_KEY, ClientState, TIME_KEY};

/// Renders a `Set-Cookie` value scoped to the whole site.
pub fn set_cookie(name: &str, value: &str, domain: Option<&str>) -> String {
	let mut cookie = format!("{name}={}; Path=/", urlencoding::encode(value));

	if let Some(domain) = domain {
		cookie.push_str("; Domain=");
		cookie.push_str(domain);
	}

	cookie
}

/// Both client-state cookies as response headers.
pub fn client_state_headers(state: &ClientState, domain: Option<&str>) -> Vec<(HeaderName, String)> {
	vec![
		(SET_COOKIE, set_cookie(TIME_KEY, &state.encode_time(), domain)),
		(SET_COOKIE, set_cookie(BRAWLERS_KEY, &state.encode_brawlers(), domain)),
	]
}

/// Decoded value of the first cookie called `name`.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
	headers
		.get_all(COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(key, _)| *key == name)
		.and_then(|(_, value)| urlencoding::decode(value).ok().map(Cow::into_owned))
}
