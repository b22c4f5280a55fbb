//! Example usage:
//!
//! ```sh
//! curl localhost:8080/cgi-bin/freshbooks-sanitize-cgi \
//!   --data 'invoiceLineAmountsAsString=60.00,40.00' \
//!   --data 'invoiceLineQuantitiesAsString=1,2' \
//!   --data 'invoiceLineTax1PercentagesAsString=5,0' \
//!   --data 'invoiceLineTax2PercentagesAsString=0,0' \
//!   --data 'invoiceDiscountPercentage=10' \
//!   --data 'invoiceAmount=95.00'
//! ```

use http::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use http::{Method, StatusCode};
use serde_json::json;
use tracing::{error, warn};

use freshbooks_sanitize::{logging, parse_body, sanitize, ConfigError, TaxCodes};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf8";
const NO_CACHE: &str = "no-cache, no-store, must-revalidate, max-age=0, s-maxage=0";

fn main() {
    logging::init();
    let tax_codes = TaxCodes::from_env();
    cgi::handle(|request: cgi::Request| -> cgi::Response { serve(request, &tax_codes) })
}

fn serve(request: cgi::Request, tax_codes: &Result<TaxCodes, ConfigError>) -> cgi::Response {
    match tax_codes {
        Ok(tax_codes) => respond(request, tax_codes),
        Err(err) => {
            error!(%err, "invalid tax code configuration");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "config_error", err.to_string())
        }
    }
}

fn respond(request: cgi::Request, tax_codes: &TaxCodes) -> cgi::Response {
    if request.method() != Method::POST {
        return error_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            "only POST is supported",
        );
    }

    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let fields = match parse_body(content_type, request.body()) {
        Ok(fields) => fields,
        Err(err) => {
            warn!(%err, "rejected request body");
            return error_response(StatusCode::BAD_REQUEST, "invalid_body", err.to_string());
        }
    };

    match sanitize(&fields, tax_codes) {
        Ok(output) => match serde_json::to_vec(&output) {
            Ok(body) => json_response(StatusCode::OK, body),
            Err(err) => {
                error!(%err, "failed to serialize response");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "serialize_error",
                    err.to_string(),
                )
            }
        },
        Err(err) => {
            warn!(code = err.code(), field = err.field(), %err, "rejected invoice");
            error_response(StatusCode::BAD_REQUEST, err.code(), err.to_string())
        }
    }
}

fn json_response(status: StatusCode, body: Vec<u8>) -> cgi::Response {
    let mut response = http::Response::new(body);
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
    response
}

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> cgi::Response {
    let body = json!({
        "error": code,
        "message": message.into(),
    });
    json_response(status, body.to_string().into_bytes())
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::*;

    const FORM: &str = "application/x-www-form-urlencoded";

    fn post(content_type: &str, body: &str) -> cgi::Request {
        http::Request::builder()
            .method(Method::POST)
            .uri("/cgi-bin/freshbooks-sanitize-cgi")
            .header(CONTENT_TYPE, content_type)
            .body(body.as_bytes().to_vec())
            .unwrap()
    }

    fn body_json(response: &cgi::Response) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn sanitizes_form_post() {
        let body = "invoiceLineAmountsAsString=60.00,40.00\
            &invoiceLineQuantitiesAsString=1,2\
            &invoiceLineTax1PercentagesAsString=5,0\
            &invoiceLineTax2PercentagesAsString=0,0\
            &invoiceDiscountPercentage=10\
            &invoiceAmount=95.00";
        let response = respond(post(FORM, body), &TaxCodes::default());

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
        assert_eq!(response.headers()[CACHE_CONTROL], NO_CACHE);

        let json = body_json(&response);
        assert_eq!(json[0]["invoiceSubTotal"], "100.00");
        assert_eq!(json[0]["taxAmount"], "5.00");
        assert_eq!(json[0]["invoiceLineTaxableStatus"], json!(["TAX", "NON"]));
        assert_eq!(json[0]["quickbooksTaxCode"], 16);
    }

    #[test]
    fn accepts_json_post() {
        let body = r#"{
            "invoiceLineAmountsAsString": "10",
            "invoiceLineQuantitiesAsString": "1",
            "invoiceLineTax1PercentagesAsString": "0",
            "invoiceLineTax2PercentagesAsString": "0",
            "invoiceDiscountPercentage": "0",
            "invoiceAmount": "10"
        }"#;
        let response = respond(post("application/json", body), &TaxCodes::new(16, 3));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response)[0]["quickbooksTaxCode"], 3);
    }

    #[test]
    fn malformed_invoice_is_bad_request() {
        let response = respond(post(FORM, "invoiceLineAmountsAsString=10"), &TaxCodes::default());

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CACHE_CONTROL], NO_CACHE);
        assert_eq!(
            body_json(&response),
            json!({
                "error": "missing_field",
                "message": "missing required field `invoiceLineQuantitiesAsString`",
            })
        );
    }

    #[test]
    fn invalid_json_body_is_bad_request() {
        let response = respond(post("application/json", "{"), &TaxCodes::default());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&response)["error"], "invalid_body");
    }

    #[test]
    fn bad_configuration_is_server_error() {
        let tax_codes = Err(ConfigError::InvalidValue {
            key: "QUICKBOOKS_TAXABLE_CODE",
            value: "sixteen".to_owned(),
        });
        let response = serve(post(FORM, "invoiceLineAmountsAsString=10"), &tax_codes);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
        let json = body_json(&response);
        assert_eq!(json["error"], "config_error");
        assert_eq!(
            json["message"],
            "environment variable QUICKBOOKS_TAXABLE_CODE has invalid value \"sixteen\""
        );
    }

    #[test]
    fn valid_configuration_is_served() {
        let response = serve(post(FORM, "a=1"), &Ok(TaxCodes::default()));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&response)["error"], "missing_field");
    }

    #[test]
    fn only_post_is_allowed() {
        let request = http::Request::builder()
            .method(Method::GET)
            .body(Vec::new())
            .unwrap();
        let response = respond(request, &TaxCodes::default());
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
