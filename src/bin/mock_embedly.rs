//! Mock Embedly API server for integration testing
//!
//! Serves canned oembed, objectify, preview and services responses on a
//! loopback port so scenarios can run without network access. Prints
//! `listening at: <addr>` once the server is bound.
//!
//! URL conventions:
//! - `*.png`, `*.jpg`, `*.gif` are photos, everything else is html
//! - URLs containing `notfound` get a per-URL 404 error entry
//! - URLs containing `malformed` make the whole response invalid JSON
//! - key `invalid` gets an HTTP 401

use serde_json::{json, Value};
use tiny_http::{Header, Method, Request, Response, Server};

use reqwest::Url;

fn main() {
    let port = std::env::args()
        .skip_while(|a| a != "--port")
        .nth(1)
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(0);

    let server = match Server::http(("127.0.0.1", port)) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("mock_embedly: failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    match server.server_addr().to_ip() {
        Some(addr) => println!("mock_embedly listening at: {}", addr),
        None => {
            eprintln!("mock_embedly: not listening on an IP address");
            std::process::exit(1);
        }
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle(request) {
            eprintln!("mock_embedly: failed to respond: {}", e);
        }
    }
}

fn handle(request: Request) -> std::io::Result<()> {
    let (status, body) = if *request.method() == Method::Get {
        route(request.url())
    } else {
        (405, error_body(405, "Method not allowed"))
    };

    let mut response = Response::from_string(body).with_status_code(status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response = response.with_header(header);
    }
    request.respond(response)
}

fn route(target: &str) -> (u16, String) {
    let url = match Url::parse(&format!("http://mock{}", target)) {
        Ok(url) => url,
        Err(_) => return (400, error_body(400, "Invalid request target")),
    };

    if url.path() == "/1/services/javascript" {
        return (200, services().to_string());
    }

    let build: fn(&str, bool) -> Value = match url.path() {
        "/1/oembed" => oembed,
        "/2/objectify" => objectify,
        "/1/preview" => preview,
        _ => return (404, error_body(404, "Not Found")),
    };

    let mut urls = Vec::new();
    let mut key = None;
    let mut force = false;
    for (name, value) in url.query_pairs() {
        match name.as_ref() {
            "urls" => urls.push(value.into_owned()),
            "key" => key = Some(value.into_owned()),
            "force" => force = value == "true",
            _ => {}
        }
    }

    if key.as_deref() == Some("invalid") {
        return (401, error_body(401, "Invalid key or oauth_consumer_key provided."));
    }
    if urls.is_empty() {
        return (400, error_body(400, "Missing required parameter: urls"));
    }
    if urls.iter().any(|u| u.contains("malformed")) {
        return (200, "[{\"type\": ".to_string());
    }

    let entries: Vec<Value> = urls.iter().map(|u| build(u, force)).collect();
    (200, Value::Array(entries).to_string())
}

fn error_body(code: u16, message: &str) -> String {
    json!({"error_code": code, "error_message": message, "type": "error"}).to_string()
}

fn services() -> Value {
    json!([
        {
            "name": "example",
            "displayname": "Example",
            "regex": ["http://example\\.com", "http://.*\\.example\\.com/.*", "http://example\\.com/.*"]
        },
        {
            "name": "youtube",
            "displayname": "YouTube",
            "regex": ["http://.*youtube\\.com/watch.*", "http://youtu\\.be/.*"]
        }
    ])
}

fn provider(url: &str) -> (String, String) {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or("unknown").to_string();
            (format!("{}://{}/", parsed.scheme(), host), host)
        }
        Err(_) => ("http://unknown/".to_string(), "unknown".to_string()),
    }
}

fn not_found(url: &str) -> Value {
    json!({
        "url": url,
        "type": "error",
        "error_code": 404,
        "error_message": "HTTP 404: Not Found",
        "version": "1.0"
    })
}

fn oembed(url: &str, force: bool) -> Value {
    if url.contains("notfound") {
        return not_found(url);
    }
    let (provider_url, provider_name) = provider(url);
    let is_photo = [".png", ".jpg", ".gif"].iter().any(|ext| url.ends_with(ext));

    let mut entry = json!({
        "type": if is_photo { "photo" } else { "html" },
        "version": "1.0",
        "provider_url": provider_url,
        "provider_name": provider_name,
        "url": url,
        "title": format!("Mock page for {}", provider_name),
        "cache_age": if force { 0 } else { 86400 }
    });
    if is_photo {
        entry["width"] = json!(640);
        entry["height"] = json!(480);
    }
    entry
}

fn objectify(url: &str, _force: bool) -> Value {
    if url.contains("notfound") {
        return not_found(url);
    }
    let (provider_url, provider_name) = provider(url);
    json!({
        "type": "html",
        "url": url,
        "provider_url": provider_url,
        "meta": {
            "title": format!("Mock page for {}", provider_name),
            "description": format!("{} is a mock page", provider_name)
        },
        "images": [{"url": format!("{}logo.png", provider_url), "width": 120, "height": 60}]
    })
}

fn preview(url: &str, force: bool) -> Value {
    if url.contains("notfound") {
        return not_found(url);
    }
    let (provider_url, provider_name) = provider(url);
    json!({
        "type": "html",
        "url": url,
        "original_url": url,
        "provider_url": provider_url,
        "provider_name": provider_name,
        "title": format!("Mock page for {}", provider_name),
        "images": [{"url": format!("{}logo.png", provider_url)}],
        "embeds": [],
        "cache_age": if force { 0 } else { 86400 }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(body: &str) -> Vec<Value> {
        serde_json::from_str::<Value>(body)
            .unwrap()
            .as_array()
            .unwrap()
            .clone()
    }

    #[test]
    fn test_route_keeps_url_order() {
        let (status, body) =
            route("/1/oembed?urls=http%3A%2F%2Fexample.com%2Fa.png&urls=http%3A%2F%2Fexample.com%2Fnotfound");
        assert_eq!(status, 200);
        let entries = entries(&body);
        assert_eq!(entries[0]["type"], "photo");
        assert_eq!(entries[1]["type"], "error");
        assert_eq!(entries[1]["error_code"], 404);
    }

    #[test]
    fn test_route_status_codes() {
        assert_eq!(route("/1/oembed?urls=x&key=invalid").0, 401);
        assert_eq!(route("/1/oembed").0, 400);
        assert_eq!(route("/3/unknown?urls=x").0, 404);
        assert_eq!(route("/1/services/javascript").0, 200);
    }

    #[test]
    fn test_route_force_flag() {
        let (_, body) = route("/1/preview?urls=http%3A%2F%2Fexample.com%2F&force=true");
        assert_eq!(entries(&body)[0]["cache_age"], 0);
    }
}
