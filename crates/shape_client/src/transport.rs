//! HTTP access to the shape endpoint.
//!
//! The transport only turns one request into a [`ShapeResponse`]; what the
//! response means for the stream is decided in `stream.rs`.

use shape_common::messages::{
    CURSOR_HEADER, HANDLE_HEADER, OFFSET_HEADER, SCHEMA_HEADER, UP_TO_DATE_HEADER,
};
use shape_common::{ShapeParams, ShapeRequest};

use crate::error::ShapeError;

/// Status and headers of one shape response, with its body read to text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeResponse {
    pub status: u16,
    pub handle: Option<String>,
    pub offset: Option<String>,
    pub schema: Option<String>,
    pub cursor: Option<String>,
    pub up_to_date: bool,
    pub body: String,
}

/// Issue the next request for `params` from the position in `request`.
pub async fn fetch_shape(
    client: &reqwest::Client,
    url: &str,
    params: &ShapeParams,
    request: &ShapeRequest,
) -> Result<ShapeResponse, ShapeError> {
    #[cfg(target_arch = "wasm32")]
    leptos::logging::log!(
        "[shape] GET {} table={} offset={} live={}",
        url,
        params.table,
        request.offset,
        request.live
    );

    let response = client.get(url).query(&request.query(params)).send().await?;

    let headers = response.headers();
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    let mut shape_response = ShapeResponse {
        status: response.status().as_u16(),
        handle: header(HANDLE_HEADER),
        offset: header(OFFSET_HEADER),
        schema: header(SCHEMA_HEADER),
        cursor: header(CURSOR_HEADER),
        up_to_date: headers.contains_key(UP_TO_DATE_HEADER),
        body: String::new(),
    };

    shape_response.body = response.text().await?;
    Ok(shape_response)
}
