//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests, so any long, non-cpu-bound operation (I/O, database calls,
//! the payout API) must be expressed as futures or asynchronous functions.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use settlement_engine::{
    charge_types::ChargeEvent,
    traits::{PayoutProvider, SettlementBackend, SettlementError},
    SettlementFlowApi,
    SettlementOutcome,
};

use crate::{
    config::{ProxyConfig, WebhookAuth},
    data_objects::WebhookAck,
    errors::ServerError,
    helpers::{get_remote_ip, verify_webhook_signature},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
            impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name);
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

//----------------------------------------------   Health  ----------------------------------------------------

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------  Webhook  ----------------------------------------------------

route!(charge_webhook => Post "/webhook/charge" impl SettlementBackend, PayoutProvider);
/// The payment provider's charge event ingress.
///
/// The provider delivers at-least-once and retries anything that is not acknowledged, so every event this service
/// has durably handled, or can never handle, is answered with 200 `{"received": true}`: duplicates, unknown event
/// types, malformed payloads, and events whose order reference will never resolve. Only a pipeline error that a
/// redelivery might fix (the engine's storage failing mid-flight) is allowed to surface as a failure status.
pub async fn charge_webhook<B, P>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<SettlementFlowApi<B, P>>,
    auth: web::Data<WebhookAuth>,
    proxy: web::Data<ProxyConfig>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementBackend,
    P: PayoutProvider,
{
    let peer = get_remote_ip(&req, proxy.use_x_forwarded_for, proxy.use_forwarded);
    trace!("🪙️ Received webhook request from {peer:?}: {}", req.uri());
    if auth.hmac_checks {
        let signature = req.headers().get("X-Signature").and_then(|v| v.to_str().ok()).unwrap_or_default();
        if !verify_webhook_signature(auth.hmac_secret.reveal(), &body, signature) {
            warn!("🪙️ Webhook signature check failed. Rejecting the call.");
            return Err(ServerError::InvalidWebhookSignature);
        }
    }
    let event = match serde_json::from_slice::<ChargeEvent>(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("🪙️ Could not parse webhook payload. Acknowledging so the provider does not retry. {e}");
            return Ok(HttpResponse::Ok().json(WebhookAck::received()));
        },
    };
    match api.process_charge_event(&event).await {
        Ok(SettlementOutcome::Settled(order)) => {
            info!("🪙️ Charge [{}] settled order {}.", event.charge_id(), order.order_id);
        },
        Ok(SettlementOutcome::AlreadySettled(order_id)) => {
            info!("🪙️ Duplicate delivery for order {order_id} suppressed.");
        },
        Ok(SettlementOutcome::Annulled(order)) => {
            info!("🪙️ Order {} marked as {}.", order.order_id, order.payment_status);
        },
        Ok(SettlementOutcome::Unchanged(order_id)) => {
            debug!("🪙️ Event [{}] left order {order_id} unchanged.", event.charge_id());
        },
        Ok(SettlementOutcome::Ignored) => {
            debug!("🪙️ Event [{}] ({}) is not actionable.", event.charge_id(), event.key);
        },
        Err(SettlementError::OrderNotFound(order_id)) => {
            // A stale or malformed order reference will never resolve; retrying cannot help.
            warn!("🪙️ Charge [{}] references unknown order {order_id}. Acknowledged.", event.charge_id());
        },
        Err(e) => {
            warn!("🪙️ Could not process charge [{}]. The provider may redeliver. {e}", event.charge_id());
            return Err(ServerError::BackendError(e.to_string()));
        },
    }
    Ok(HttpResponse::Ok().json(WebhookAck::received()))
}
