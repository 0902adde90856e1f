use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, Headers, HtmlFormElement, Request, RequestInit, Response};

use crate::error::ComposerError;
use crate::lookup::{parse_lookup_body, Candidate};
use crate::upload::UploadResponse;

pub fn lookup_url(base: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) => {
            let separator = if base.contains('?') { '&' } else { '?' };
            let encoded = String::from(js_sys::encode_uri_component(prefix));
            format!("{base}{separator}prefix={encoded}")
        }
        None => base.to_string(),
    }
}

async fn send(url: &str, init: &RequestInit) -> Result<Response, ComposerError> {
    let window = web_sys::window().ok_or_else(|| ComposerError::Dom("no window".into()))?;
    let request =
        Request::new_with_str_and_init(url, init).map_err(|e| ComposerError::network(url, &e))?;
    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| ComposerError::network(url, &e))?
        .dyn_into::<Response>()
        .map_err(|e| ComposerError::network(url, &e))?;
    if !response.ok() {
        return Err(ComposerError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }
    Ok(response)
}

async fn body_text(url: &str, response: &Response) -> Result<String, ComposerError> {
    let promise = response.text().map_err(|e| ComposerError::network(url, &e))?;
    let body = JsFuture::from(promise)
        .await
        .map_err(|e| ComposerError::network(url, &e))?;
    Ok(body.as_string().unwrap_or_default())
}

/// `GET <base>[?prefix=...]`. A body that isn't a list of names is treated
/// as no candidates rather than an error.
pub async fn fetch_candidates(
    base: &str,
    prefix: Option<&str>,
) -> Result<Vec<Candidate>, ComposerError> {
    let url = lookup_url(base, prefix);
    let headers = Headers::new().map_err(|e| ComposerError::Dom(format!("{e:?}")))?;
    headers
        .set("Accept", "application/json")
        .map_err(|e| ComposerError::Dom(format!("{e:?}")))?;
    let init = RequestInit::new();
    init.set_method("GET");
    init.set_headers(&headers);

    tracing::debug!(%url, "looking up mention candidates");
    let response = send(&url, &init).await?;
    let body = body_text(&url, &response).await?;
    Ok(parse_lookup_body(&body))
}

/// Posts `form` as multipart and decodes the `{"Path": ...}` reply.
pub async fn upload_media(
    url: &str,
    form: &HtmlFormElement,
) -> Result<UploadResponse, ComposerError> {
    let data = FormData::new_with_form(form).map_err(|e| ComposerError::Dom(format!("{e:?}")))?;
    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&data);

    tracing::info!(%url, "uploading media");
    let response = send(url, &init).await?;
    let body = body_text(url, &response).await?;
    serde_json::from_str(&body).map_err(|e| ComposerError::Decode(e.to_string()))
}
