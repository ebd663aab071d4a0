//! Pages shown to whoever scanned a pairing code

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::flow::{PairingFailure, PairingSuccess};

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(status: StatusCode, title: &str, message: &str) -> Response {
    let body = format!(
        "<!DOCTYPE html>\n\
         <html><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{title}</title></head>\
         <body><h1>{title}</h1><p>{message}</p></body></html>\n",
        title = escape(title),
        message = escape(message),
    );
    (status, Html(body)).into_response()
}

/// Confirmation naming the client and the room
pub fn success(result: &PairingSuccess) -> Response {
    page(
        StatusCode::OK,
        "Paired",
        &format!(
            "Your device ({}) is now paired with {}. You can start casting.",
            result.pairing.client_mac, result.room.name
        ),
    )
}

pub fn failure(failure: &PairingFailure) -> Response {
    let status = if failure.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    page(status, "Pairing failed", &failure.to_string())
}

pub fn bad_room_id(raw: &str) -> Response {
    page(
        StatusCode::BAD_REQUEST,
        "Invalid link",
        &format!("\"{}\" is not a valid room id.", raw),
    )
}

pub fn bad_signature() -> Response {
    page(
        StatusCode::FORBIDDEN,
        "Invalid link",
        "This pairing link is not valid. Scan the code displayed in the room again.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<script>\"a\" & 'b'</script>"),
            "&lt;script&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_failure_status() {
        use cast_core::RoomId;

        assert_eq!(
            failure(&PairingFailure::RoomNotFound(RoomId(1))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            failure(&PairingFailure::UnresolvedClient {
                ip: "10.0.0.1".parse().unwrap()
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(bad_signature().status(), StatusCode::FORBIDDEN);
        assert_eq!(bad_room_id("x").status(), StatusCode::BAD_REQUEST);
    }
}
