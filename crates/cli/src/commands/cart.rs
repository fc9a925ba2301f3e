//! Cart action commands.
//!
//! Each command builds a headless page containing the element a shopper
//! would interact with, dispatches the matching event through the installed
//! interceptors, and reports the toast and location afterwards.
//!
//! # Environment Variables
//!
//! - `RINK_BASE_URL` - Rental site the endpoints resolve against
//! - `RINK_COOKIES` - Cookie string holding the CSRF token

use std::sync::Arc;

use rink_rental_core::{CartAction, Severity};
use rink_rental_storefront::interceptors::trigger;
use rink_rental_storefront::{
    CartClient, Dispatcher, Document, DomEvent, Element, EnhanceConfig, MemoryDocument,
    MemorySurface, ToastNotifier, install,
};
use thiserror::Error;

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// No interceptor picked up the event.
    #[error("No interceptor handled the {0} event")]
    Unhandled(CartAction),

    /// The interceptor task panicked or was cancelled.
    #[error("Cart handler failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The action finished with an error toast.
    #[error("Cart action failed: {0}")]
    Rejected(String),
}

/// Parse a `name=value` form field.
///
/// # Errors
///
/// Returns an error message if the input has no `=` or an empty name.
pub fn parse_field(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("invalid field `{input}`, expected name=value")),
    }
}

/// Headless page with the interceptors installed.
struct HeadlessPage {
    config: Arc<EnhanceConfig>,
    document: MemoryDocument,
    surface: MemorySurface,
    dispatcher: Dispatcher,
    cart: Element,
}

impl HeadlessPage {
    fn new(config: EnhanceConfig, cookies: &str) -> Self {
        let config = Arc::new(config);
        let document = MemoryDocument::new(config.base_url.as_str(), cookies);
        let surface = MemorySurface::new();
        let notifier = Arc::new(ToastNotifier::new(
            Arc::new(surface.clone()),
            config.toast_duration,
        ));
        let page: Arc<dyn Document> = Arc::new(document.clone());

        let mut dispatcher = Dispatcher::new();
        install(
            &mut dispatcher,
            &CartClient::from_config(&config),
            &notifier,
            &page,
            &config,
        );

        let cart = document.append(
            None,
            Element::new("ul").with_id(config.cart_container_id.clone()),
        );

        Self {
            config,
            document,
            surface,
            dispatcher,
            cart,
        }
    }

    /// Dispatch `event` and wait for every handler to finish.
    async fn fire(&self, action: CartAction, event: DomEvent) -> Result<(), CartCommandError> {
        let handles = self.dispatcher.dispatch(&event);
        if handles.is_empty() {
            return Err(CartCommandError::Unhandled(action));
        }
        for handle in handles {
            handle.await?;
        }
        self.report()
    }

    fn report(&self) -> Result<(), CartCommandError> {
        let toast = self.surface.snapshot();
        let severity = toast.severity().unwrap_or_default();

        tracing::info!(%severity, title = %toast.title, message = %toast.message, "Toast");
        tracing::info!(location = %self.document.location(), "Location");
        if let Some(html) = self
            .document
            .inner_html(&self.config.cart_container_id)
            .filter(|html| !html.is_empty())
        {
            tracing::info!(cart_html = %html, "Cart updated");
        }

        if severity == Severity::Error {
            return Err(CartCommandError::Rejected(toast.message));
        }
        Ok(())
    }
}

/// Submit an add-to-cart form.
///
/// # Errors
///
/// Returns error if no interceptor ran or the action ended in an error toast.
pub async fn add(
    config: EnhanceConfig,
    cookies: &str,
    action: &str,
    fields: Vec<(String, String)>,
) -> Result<(), CartCommandError> {
    let page = HeadlessPage::new(config, cookies);
    let (_, marker) = trigger(CartAction::AddToCart);

    let form = fields.into_iter().fold(
        Element::new("form").with_class(marker).with_action(action),
        |form, (name, value)| form.with_field(name, value),
    );
    let form = page.document.append(None, form);

    tracing::info!(action, "Submitting add-to-cart form");
    page.fire(CartAction::AddToCart, DomEvent::submit(form)).await
}

/// Click a remove button inside a cart item.
///
/// # Errors
///
/// Returns error if no interceptor ran or the action ended in an error toast.
pub async fn remove(
    config: EnhanceConfig,
    cookies: &str,
    id: Option<String>,
    href: Option<String>,
) -> Result<(), CartCommandError> {
    let page = HeadlessPage::new(config, cookies);
    let (_, marker) = trigger(CartAction::RemoveFromCart);

    let item = page.document.append(
        Some(page.cart.node()),
        Element::new("li").with_class(page.config.cart_item_class.clone()),
    );
    let mut button = Element::new("button").with_class(marker);
    if let Some(id) = id {
        button = button.with_data("id", id);
    }
    if let Some(href) = href {
        button = button.with_data("href", href);
    }
    let button = page.document.append(Some(item.node()), button);

    tracing::info!("Clicking remove button");
    let result = page
        .fire(CartAction::RemoveFromCart, DomEvent::click(button))
        .await;
    tracing::info!(removed = !page.document.contains(item.node()), "Cart item");
    result
}

/// Click the checkout button.
///
/// # Errors
///
/// Returns error if no interceptor ran or the action ended in an error toast.
pub async fn checkout(
    config: EnhanceConfig,
    cookies: &str,
    href: Option<String>,
) -> Result<(), CartCommandError> {
    let page = HeadlessPage::new(config, cookies);
    let (_, marker) = trigger(CartAction::Checkout);

    let mut button = Element::new("button").with_class(marker);
    if let Some(href) = href {
        button = button.with_data("href", href);
    }
    let button = page.document.append(None, button);

    tracing::info!("Clicking checkout button");
    page.fire(CartAction::Checkout, DomEvent::click(button)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("days=2"),
            Ok(("days".to_string(), "2".to_string()))
        );
        assert_eq!(
            parse_field("note=a=b"),
            Ok(("note".to_string(), "a=b".to_string()))
        );
        assert_eq!(parse_field("empty="), Ok(("empty".to_string(), String::new())));
        assert!(parse_field("=1").is_err());
        assert!(parse_field("days").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_network_error() {
        let config = EnhanceConfig {
            base_url: url::Url::parse("http://127.0.0.1:9").expect("url"),
            ..EnhanceConfig::default()
        };
        let result = checkout(config, "csrftoken=abc", None).await;
        match result {
            Err(CartCommandError::Rejected(message)) => assert_eq!(message, "Network error"),
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remove_without_id_is_rejected_before_sending() {
        let result = remove(EnhanceConfig::default(), "", None, None).await;
        match result {
            Err(CartCommandError::Rejected(message)) => assert_eq!(message, "Error"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}
