//! Cart action interceptors.
//!
//! Each interceptor suppresses the default submission or navigation, sends
//! a background request, and routes the JSON result to the toast and the
//! page. Response handling follows a fixed priority:
//!
//! 1. transport failure or unparseable body: error toast, generic message
//! 2. failing HTTP status (with [`StatusPolicy::StatusFirst`]): error toast
//! 3. `login_required`: informational toast, no side effect
//! 4. `success`: success toast plus the action's side effect
//! 5. anything else: error toast

use std::sync::Arc;

use futures::future::BoxFuture;
use rink_rental_core::{ActionResult, CartAction, Severity};
use serde_json::{Map, Value};
use tracing::{Span, debug, field, instrument, warn};

use crate::client::{ActionResponse, CartClient};
use crate::config::{EnhanceConfig, StatusPolicy};
use crate::cookies::CsrfToken;
use crate::dom::{Document, Element};
use crate::error::ActionError;
use crate::events::{Dispatcher, DomEvent, EventHandler, EventKind, Matcher};
use crate::toast::ToastNotifier;

/// Page mutation performed after a successful action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Replace the cart container's contents with the returned fragment.
    ReplaceCart(String),
    /// Remove the triggering element's enclosing cart item.
    RemoveItem,
    /// Send the browser to a new location.
    Navigate(String),
}

/// Toast to show and side effect to perform for one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub severity: Severity,
    pub message: String,
    pub effect: Option<Effect>,
}

impl Outcome {
    fn notice(severity: Severity, message: &str) -> Self {
        Self {
            severity,
            message: message.to_string(),
            effect: None,
        }
    }
}

/// Event kind and marker class that trigger `action`.
#[must_use]
pub const fn trigger(action: CartAction) -> (EventKind, &'static str) {
    match action {
        CartAction::AddToCart => (EventKind::Submit, "ajax-add-to-cart"),
        CartAction::RemoveFromCart => (EventKind::Click, "remove-ajax"),
        CartAction::Checkout => (EventKind::Click, "checkout-ajax"),
    }
}

/// Endpoint for `action` triggered on `target`.
///
/// An explicit non-empty `data-href` always wins. Otherwise add-to-cart
/// rewrites the form's `action` to its background counterpart, remove fills
/// the remove template with `data-id`, and checkout uses the checkout path.
///
/// # Errors
///
/// Returns `ActionError::MissingAttribute` if the element lacks the
/// attribute the endpoint is derived from.
pub fn endpoint(
    action: CartAction,
    target: &Element,
    config: &EnhanceConfig,
) -> Result<String, ActionError> {
    if let Some(href) = non_empty(target.data("href")) {
        return Ok(href.to_string());
    }

    match action {
        CartAction::AddToCart => {
            let form_action =
                non_empty(target.action()).ok_or(ActionError::MissingAttribute("action"))?;
            Ok(form_action.replacen(&config.add_path_from, &config.add_path_to, 1))
        }
        CartAction::RemoveFromCart => {
            let id =
                non_empty(target.data("id")).ok_or(ActionError::MissingAttribute("data-id"))?;
            Ok(config.remove_path(id))
        }
        CartAction::Checkout => Ok(config.checkout_path.clone()),
    }
}

/// JSON body for `action`: the form's fields for add-to-cart, none otherwise.
///
/// A repeated field name keeps its last value.
#[must_use]
pub fn payload(action: CartAction, target: &Element) -> Option<Value> {
    match action {
        CartAction::AddToCart => {
            let fields: Map<String, Value> = target
                .fields()
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                .collect();
            Some(Value::Object(fields))
        }
        CartAction::RemoveFromCart | CartAction::Checkout => None,
    }
}

/// Decide the toast and side effect for one response.
#[must_use]
pub fn resolve_outcome(
    action: CartAction,
    config: &EnhanceConfig,
    response: Result<ActionResponse, ActionError>,
) -> Outcome {
    let response = match response {
        Ok(response) => response,
        Err(ActionError::Transport(e)) => {
            warn!(%action, error = %e, "Cart action transport failure");
            return Outcome::notice(Severity::Error, action.network_message());
        }
        Err(e) => {
            warn!(%action, error = %e, "Cart action could not be sent");
            return Outcome::notice(Severity::Error, action.failure_message());
        }
    };

    let Some(body) = response.body else {
        return Outcome::notice(Severity::Error, action.malformed_message());
    };

    if config.status_policy == StatusPolicy::StatusFirst && !response.status.is_success() {
        debug!(%action, status = %response.status, "Cart action rejected by status");
        return Outcome::notice(Severity::Error, body.message_or(action.failure_message()));
    }

    if body.login_required {
        return Outcome::notice(Severity::Normal, body.message_or(action.login_message()));
    }

    if body.success {
        return Outcome {
            severity: Severity::Success,
            message: body.message_or(action.success_message()).to_string(),
            effect: success_effect(action, config, &body),
        };
    }

    Outcome::notice(Severity::Error, body.message_or(action.failure_message()))
}

fn success_effect(
    action: CartAction,
    config: &EnhanceConfig,
    body: &ActionResult,
) -> Option<Effect> {
    match action {
        CartAction::AddToCart => body
            .cart_html()
            .map(|html| Effect::ReplaceCart(html.to_string())),
        CartAction::RemoveFromCart => Some(Effect::RemoveItem),
        CartAction::Checkout => Some(Effect::Navigate(body.rental_id().map_or_else(
            || config.checkout_fallback.clone(),
            |id| config.checkout_success_path(id.as_str()),
        ))),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

struct InterceptorInner {
    action: CartAction,
    client: CartClient,
    notifier: Arc<ToastNotifier>,
    document: Arc<dyn Document>,
    config: Arc<EnhanceConfig>,
}

/// Interceptor for one cart action.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct ActionInterceptor {
    inner: Arc<InterceptorInner>,
}

impl std::fmt::Debug for ActionInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionInterceptor")
            .field("action", &self.inner.action)
            .finish_non_exhaustive()
    }
}

impl ActionInterceptor {
    #[must_use]
    pub fn new(
        action: CartAction,
        client: CartClient,
        notifier: Arc<ToastNotifier>,
        document: Arc<dyn Document>,
        config: Arc<EnhanceConfig>,
    ) -> Self {
        Self {
            inner: Arc::new(InterceptorInner {
                action,
                client,
                notifier,
                document,
                config,
            }),
        }
    }

    #[must_use]
    pub fn action(&self) -> CartAction {
        self.inner.action
    }

    /// Perform the action for `target` and apply the outcome to the page.
    #[instrument(skip_all, fields(action = %self.inner.action, endpoint = field::Empty))]
    pub async fn run(&self, target: &Element) -> Outcome {
        let inner = &self.inner;

        // Re-read on every request; the token may have rotated.
        let token =
            CsrfToken::from_cookies(&inner.document.cookie_header(), &inner.config.csrf_cookie);

        let response = match endpoint(inner.action, target, &inner.config) {
            Ok(endpoint) => {
                Span::current().record("endpoint", endpoint.as_str());
                let body = payload(inner.action, target);
                inner
                    .client
                    .post(&endpoint, token.as_ref(), body.as_ref())
                    .await
            }
            Err(e) => Err(e),
        };

        let outcome = resolve_outcome(inner.action, &inner.config, response);
        self.apply(&outcome, target);
        outcome
    }

    fn apply(&self, outcome: &Outcome, target: &Element) {
        let inner = &self.inner;
        inner
            .notifier
            .notify(outcome.severity.title(), &outcome.message, outcome.severity);

        match &outcome.effect {
            Some(Effect::ReplaceCart(html)) => {
                if !inner
                    .document
                    .replace_inner_html(&inner.config.cart_container_id, html)
                {
                    debug!(container = %inner.config.cart_container_id, "Cart container not on page");
                }
            }
            Some(Effect::RemoveItem) => {
                if !inner
                    .document
                    .remove_closest(target.node(), &inner.config.cart_item_class)
                {
                    debug!(class = %inner.config.cart_item_class, "No enclosing cart item to remove");
                }
            }
            Some(Effect::Navigate(location)) => inner.document.navigate(location),
            None => {}
        }
    }
}

impl EventHandler for ActionInterceptor {
    fn handle(&self, event: DomEvent) -> BoxFuture<'static, ()> {
        let this = self.clone();
        Box::pin(async move {
            this.run(event.target()).await;
        })
    }
}

/// Bind the add-to-cart, remove and checkout interceptors.
pub fn install(
    dispatcher: &mut Dispatcher,
    client: &CartClient,
    notifier: &Arc<ToastNotifier>,
    document: &Arc<dyn Document>,
    config: &Arc<EnhanceConfig>,
) {
    for action in [
        CartAction::AddToCart,
        CartAction::RemoveFromCart,
        CartAction::Checkout,
    ] {
        let (kind, marker) = trigger(action);
        let interceptor = ActionInterceptor::new(
            action,
            client.clone(),
            Arc::clone(notifier),
            Arc::clone(document),
            Arc::clone(config),
        );
        dispatcher.bind(kind, Matcher::class(marker), Arc::new(interceptor));
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use rink_rental_core::RentalId;

    use super::*;

    fn respond(status: StatusCode, json: &str) -> Result<ActionResponse, ActionError> {
        Ok(ActionResponse {
            status,
            body: serde_json::from_str(json).ok(),
        })
    }

    fn ok(json: &str) -> Result<ActionResponse, ActionError> {
        respond(StatusCode::OK, json)
    }

    fn body_only() -> EnhanceConfig {
        EnhanceConfig {
            status_policy: StatusPolicy::BodyOnly,
            ..EnhanceConfig::default()
        }
    }

    #[test]
    fn test_success_with_cart_html() {
        let config = EnhanceConfig::default();
        let outcome = resolve_outcome(
            CartAction::AddToCart,
            &config,
            ok(r#"{"success":true,"message":"Added!","cart_html":"<li>Skates</li>"}"#),
        );
        assert_eq!(outcome.severity, Severity::Success);
        assert_eq!(outcome.message, "Added!");
        assert_eq!(outcome.effect, Some(Effect::ReplaceCart("<li>Skates</li>".to_string())));
    }

    #[test]
    fn test_success_without_cart_html_has_no_effect() {
        let config = EnhanceConfig::default();
        let outcome = resolve_outcome(CartAction::AddToCart, &config, ok(r#"{"success":true}"#));
        assert_eq!(outcome.message, "Added to cart");
        assert_eq!(outcome.effect, None);
    }

    #[test]
    fn test_business_failure_uses_server_message() {
        let config = EnhanceConfig::default();
        for action in [CartAction::AddToCart, CartAction::RemoveFromCart, CartAction::Checkout] {
            let outcome = resolve_outcome(
                action,
                &config,
                ok(r#"{"success":false,"message":"Out of stock"}"#),
            );
            assert_eq!(outcome.severity, Severity::Error);
            assert_eq!(outcome.message, "Out of stock");
            assert_eq!(outcome.effect, None);
        }
    }

    #[test]
    fn test_business_failure_default_message() {
        let config = EnhanceConfig::default();
        let outcome = resolve_outcome(CartAction::Checkout, &config, ok("{}"));
        assert_eq!(outcome.severity, Severity::Error);
        assert_eq!(outcome.message, "Error");
    }

    #[test]
    fn test_login_required_beats_success() {
        let config = EnhanceConfig::default();
        for json in [
            r#"{"login_required":true}"#,
            r#"{"login_required":true,"success":true,"rental_id":5}"#,
            r#"{"login_required":true,"success":false}"#,
        ] {
            let outcome = resolve_outcome(CartAction::Checkout, &config, ok(json));
            assert_eq!(outcome.severity, Severity::Normal, "{json}");
            assert_eq!(outcome.message, "Please login to continue");
            assert_eq!(outcome.effect, None);
        }
    }

    #[test]
    fn test_null_success_flag_keeps_server_message() {
        let config = EnhanceConfig::default();
        let outcome = resolve_outcome(
            CartAction::AddToCart,
            &config,
            ok(r#"{"success":null,"message":"Out of stock"}"#),
        );
        assert_eq!(outcome.severity, Severity::Error);
        assert_eq!(outcome.message, "Out of stock");
        assert_eq!(outcome.effect, None);
    }

    #[test]
    fn test_null_login_flag_does_not_block_success() {
        let config = EnhanceConfig::default();
        let outcome = resolve_outcome(
            CartAction::AddToCart,
            &config,
            ok(r#"{"success":true,"login_required":null,"message":"Added!","cart_html":"<li>Skates</li>"}"#),
        );
        assert_eq!(outcome.severity, Severity::Success);
        assert_eq!(outcome.message, "Added!");
        assert_eq!(outcome.effect, Some(Effect::ReplaceCart("<li>Skates</li>".to_string())));
    }

    #[test]
    fn test_transport_failure_is_network_error() {
        let config = EnhanceConfig::default();
        let outcome = resolve_outcome(
            CartAction::RemoveFromCart,
            &config,
            Err(ActionError::Transport("connection refused".to_string())),
        );
        assert_eq!(outcome.severity, Severity::Error);
        assert_eq!(outcome.message, "Network error");
        assert_eq!(outcome.effect, None);
    }

    #[test]
    fn test_missing_attribute_is_generic_error() {
        let config = EnhanceConfig::default();
        let outcome = resolve_outcome(
            CartAction::RemoveFromCart,
            &config,
            Err(ActionError::MissingAttribute("data-id")),
        );
        assert_eq!(outcome.severity, Severity::Error);
        assert_eq!(outcome.message, "Error");
    }

    #[test]
    fn test_unparseable_body() {
        let config = EnhanceConfig::default();
        let add = resolve_outcome(CartAction::AddToCart, &config, ok("<html>500</html>"));
        assert_eq!(add.severity, Severity::Error);
        assert_eq!(add.message, "Server response error");

        let remove = resolve_outcome(CartAction::RemoveFromCart, &config, ok("null"));
        assert_eq!(remove.message, "Server error");
    }

    #[test]
    fn test_status_first_rejects_non_2xx() {
        let config = EnhanceConfig::default();
        let outcome = resolve_outcome(
            CartAction::AddToCart,
            &config,
            respond(StatusCode::BAD_REQUEST, r#"{"success":true,"message":"Too many days"}"#),
        );
        assert_eq!(outcome.severity, Severity::Error);
        assert_eq!(outcome.message, "Too many days");
        assert_eq!(outcome.effect, None);
    }

    #[test]
    fn test_status_first_reports_unauthorized_as_error() {
        let config = EnhanceConfig::default();
        let outcome = resolve_outcome(
            CartAction::AddToCart,
            &config,
            respond(StatusCode::UNAUTHORIZED, r#"{"success":false,"login_required":true}"#),
        );
        assert_eq!(outcome.severity, Severity::Error);
        assert_eq!(outcome.message, "Error");
    }

    #[test]
    fn test_body_only_ignores_status() {
        let config = body_only();
        let outcome = resolve_outcome(
            CartAction::AddToCart,
            &config,
            respond(StatusCode::UNAUTHORIZED, r#"{"success":false,"login_required":true}"#),
        );
        assert_eq!(outcome.severity, Severity::Normal);
        assert_eq!(outcome.message, "Please login to continue");
    }

    #[test]
    fn test_checkout_navigates_to_success_page() {
        let config = EnhanceConfig::default();
        let outcome = resolve_outcome(
            CartAction::Checkout,
            &config,
            ok(r#"{"success":true,"rental_id":"42"}"#),
        );
        assert_eq!(outcome.message, "Checkout success");
        assert_eq!(
            outcome.effect,
            Some(Effect::Navigate("/rental/checkout/42/success/".to_string()))
        );
    }

    #[test]
    fn test_checkout_without_rental_id_uses_fallback() {
        let config = EnhanceConfig::default();
        let outcome = resolve_outcome(CartAction::Checkout, &config, ok(r#"{"success":true}"#));
        assert_eq!(outcome.effect, Some(Effect::Navigate("#".to_string())));
    }

    #[test]
    fn test_remove_success_removes_item() {
        let config = EnhanceConfig::default();
        let outcome =
            resolve_outcome(CartAction::RemoveFromCart, &config, ok(r#"{"success":true}"#));
        assert_eq!(outcome.message, "Removed");
        assert_eq!(outcome.effect, Some(Effect::RemoveItem));
    }

    #[test]
    fn test_success_effect_uses_rental_id_accessor() {
        let config = EnhanceConfig::default();
        let body = ActionResult {
            success: true,
            rental_id: Some(RentalId::new("")),
            ..ActionResult::default()
        };
        assert_eq!(
            success_effect(CartAction::Checkout, &config, &body),
            Some(Effect::Navigate("#".to_string()))
        );
    }

    #[test]
    fn test_add_endpoint_rewrites_form_action() {
        let config = EnhanceConfig::default();
        let form = Element::new("form").with_action("/rental/cart/add/9/");
        assert_eq!(
            endpoint(CartAction::AddToCart, &form, &config).expect("endpoint"),
            "/rental/cart/add-ajax/9/"
        );
    }

    #[test]
    fn test_add_endpoint_without_action() {
        let config = EnhanceConfig::default();
        let form = Element::new("form");
        assert!(matches!(
            endpoint(CartAction::AddToCart, &form, &config),
            Err(ActionError::MissingAttribute("action"))
        ));
    }

    #[test]
    fn test_remove_endpoint_from_id_or_href() {
        let config = EnhanceConfig::default();
        let by_id = Element::new("button").with_data("id", "12");
        assert_eq!(
            endpoint(CartAction::RemoveFromCart, &by_id, &config).expect("endpoint"),
            "/rental/cart/remove-ajax/12/"
        );

        let by_href = Element::new("button")
            .with_data("id", "12")
            .with_data("href", "/custom/remove/12/");
        assert_eq!(
            endpoint(CartAction::RemoveFromCart, &by_href, &config).expect("endpoint"),
            "/custom/remove/12/"
        );

        let neither = Element::new("button").with_data("href", "");
        assert!(endpoint(CartAction::RemoveFromCart, &neither, &config).is_err());
    }

    #[test]
    fn test_checkout_endpoint_default() {
        let config = EnhanceConfig::default();
        let button = Element::new("button").with_class("checkout-ajax");
        assert_eq!(
            endpoint(CartAction::Checkout, &button, &config).expect("endpoint"),
            "/rental/checkout-ajax/"
        );
    }

    #[test]
    fn test_payload_collects_form_fields() {
        let form = Element::new("form")
            .with_field("quantity", "1")
            .with_field("days", "2")
            .with_field("days", "3");
        let body = payload(CartAction::AddToCart, &form).expect("payload");
        assert_eq!(body, serde_json::json!({"quantity": "1", "days": "3"}));
        assert_eq!(payload(CartAction::Checkout, &form), None);
    }

    #[test]
    fn test_install_binds_three_interceptors() {
        let config = Arc::new(EnhanceConfig::default());
        let document: Arc<dyn Document> = Arc::new(crate::dom::MemoryDocument::default());
        let notifier = Arc::new(ToastNotifier::detached(config.toast_duration));
        let mut dispatcher = Dispatcher::new();
        install(
            &mut dispatcher,
            &CartClient::from_config(&config),
            &notifier,
            &document,
            &config,
        );
        assert_eq!(dispatcher.len(), 3);
    }
}
