//! Inbound call dispatch: binding, coercion, overload ranking, invocation.
//!
//! Given a decoded Request or Notification, the dispatcher resolves the
//! service through the registry, selects the best-matching handler overload,
//! coerces the wire params into typed arguments, invokes the handler, and
//! produces the Response or Error message to return to the caller. Every
//! failure maps to one of the closed set of JSON-RPC error codes; handler
//! failures and panics never reach the transport.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::RwLock;

use serde_json::{json, Map, Value};
use tokio::sync::mpsc;

use super::descriptor::{
    DeferredReply, HandlerError, HandlerKind, MethodSpec, ParamDir, ParamKind, ParamSpec, Service,
};
use super::registry::ServiceRegistry;
use crate::message::{error_codes, Message, WireFormat};

/// Session facilities a dispatched call may need beyond its reply.
pub(crate) struct DispatchContext {
    /// Outbound queue of the originating session, for deferred responses.
    pub(crate) outbound: mpsc::Sender<Vec<u8>>,
    /// Wire format of the originating session.
    pub(crate) format: WireFormat,
}

/// Route one inbound Request or Notification.
///
/// Returns the reply to write back, or `None` when no reply is due: the
/// message was a notification, or the handler deferred its response.
pub(crate) fn dispatch(
    registry: &RwLock<ServiceRegistry>,
    message: &Message,
    ctx: &DispatchContext,
) -> Option<Message> {
    let method = message.method()?;
    let is_request = matches!(message, Message::Request { .. });

    let resolved = {
        let guard = match registry.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.resolve(method)
    };

    let reply = match resolved {
        Some((service, unqualified)) => dispatch_call(&service, &unqualified, message, ctx),
        None => Some(Message::error_response(
            message,
            error_codes::METHOD_NOT_FOUND,
            format!("method not found: {}", method),
        )),
    };

    if is_request {
        reply
    } else {
        None
    }
}

/// Dispatch against an already-resolved service.
fn dispatch_call(
    service: &Service,
    method: &str,
    message: &Message,
    ctx: &DispatchContext,
) -> Option<Message> {
    let Some(overloads) = service.overloads(method) else {
        return Some(Message::error_response(
            message,
            error_codes::METHOD_NOT_FOUND,
            format!("method not found: {}", method),
        ));
    };

    let input = BindInput::from_params(message.params());

    let mut best: Option<(usize, Binding)> = None;
    for (index, spec) in overloads.iter().enumerate() {
        let Some(binding) = try_bind(spec, &input) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some((_, current)) => {
                binding.exact > current.exact
                    || (binding.exact == current.exact && binding.defaulted < current.defaulted)
            }
        };
        if better {
            best = Some((index, binding));
        }
    }

    let Some((index, mut binding)) = best else {
        return Some(Message::error_response(
            message,
            error_codes::INVALID_PARAMS,
            "params do not match any overload",
        ));
    };

    invoke(&overloads[index], &mut binding, message, ctx)
}

/// Params normalized for binding: positional or named.
enum BindInput {
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl BindInput {
    fn from_params(params: Option<&Value>) -> Self {
        match params {
            None => BindInput::Positional(Vec::new()),
            Some(Value::Array(items)) => BindInput::Positional(items.clone()),
            Some(Value::Object(map)) => BindInput::Named(map.clone()),
            // A bare scalar behaves like a one-element array.
            Some(other) => BindInput::Positional(vec![other.clone()]),
        }
    }
}

/// The arguments produced by a successful bind, plus its ranking metrics.
struct Binding {
    args: Vec<Value>,
    exact: usize,
    defaulted: usize,
    named: bool,
}

fn try_bind(spec: &MethodSpec, input: &BindInput) -> Option<Binding> {
    match input {
        BindInput::Positional(supplied) => {
            if supplied.len() > spec.params.len() {
                return None;
            }
            let mut binding = Binding {
                args: Vec::with_capacity(spec.params.len()),
                exact: 0,
                defaulted: 0,
                named: false,
            };
            for (position, param) in spec.params.iter().enumerate() {
                match supplied.get(position) {
                    Some(value) => bind_supplied(param, value, &mut binding)?,
                    None => bind_missing(param, &mut binding)?,
                }
            }
            Some(binding)
        }
        BindInput::Named(map) => {
            let mut binding = Binding {
                args: Vec::with_capacity(spec.params.len()),
                exact: 0,
                defaulted: 0,
                named: true,
            };
            // Extra keys are ignored; every required name must be present.
            for param in &spec.params {
                match map.get(param.name()) {
                    Some(value) => bind_supplied(param, value, &mut binding)?,
                    None => bind_missing(param, &mut binding)?,
                }
            }
            Some(binding)
        }
    }
}

fn bind_supplied(param: &ParamSpec, value: &Value, binding: &mut Binding) -> Option<()> {
    let (coerced, exact) = coerce(value, param.kind())?;
    if exact {
        binding.exact += 1;
    }
    binding.args.push(coerced);
    Some(())
}

fn bind_missing(param: &ParamSpec, binding: &mut Binding) -> Option<()> {
    if let Some(default) = param.default() {
        binding.args.push(default.clone());
        binding.defaulted += 1;
    } else if param.dir() != ParamDir::In {
        // Omitted out and in/out slots start from the type's zero.
        binding.args.push(param.kind().zero_value());
    } else {
        return None;
    }
    Some(())
}

/// Coerce one JSON value to a declared parameter kind.
///
/// Returns the argument value and whether the match was exact; exactness
/// feeds overload ranking. `None` means the candidate is not bind-feasible.
fn coerce(value: &Value, kind: &ParamKind) -> Option<(Value, bool)> {
    match kind {
        ParamKind::Bool => value.as_bool().map(|b| (json!(b), true)),
        ParamKind::Int => match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some((json!(i), true))
                } else {
                    let f = n.as_f64()?;
                    // A whole-valued float narrows; a fractional one fails.
                    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                        Some((json!(f as i64), false))
                    } else {
                        None
                    }
                }
            }
            _ => None,
        },
        ParamKind::Float => match value {
            Value::Number(n) => Some((value.clone(), n.is_f64())),
            _ => None,
        },
        ParamKind::String => value.as_str().map(|s| (json!(s), true)),
        ParamKind::List(inner) => match value {
            Value::Array(items) => {
                let mut all_exact = true;
                let mut converted = Vec::with_capacity(items.len());
                for item in items {
                    let (element, exact) = coerce(item, inner)?;
                    all_exact &= exact;
                    converted.push(element);
                }
                Some((Value::Array(converted), all_exact))
            }
            _ => None,
        },
        ParamKind::VariantList => match value {
            Value::Array(_) => Some((value.clone(), false)),
            _ => None,
        },
        ParamKind::VariantMap => match value {
            Value::Object(_) => Some((value.clone(), false)),
            _ => None,
        },
        ParamKind::Variant => Some((value.clone(), false)),
    }
}

fn invoke(
    spec: &MethodSpec,
    binding: &mut Binding,
    message: &Message,
    ctx: &DispatchContext,
) -> Option<Message> {
    match &spec.handler {
        HandlerKind::Value(handler) => {
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(&mut binding.args)));
            Some(match flatten(outcome) {
                Ok(result) => Message::response(message, result),
                Err(reason) => internal_error(message, reason),
            })
        }
        HandlerKind::Void(handler) => {
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(&mut binding.args)));
            Some(match flatten(outcome) {
                Ok(_) => {
                    let result = if binding.named {
                        gather_outputs(&spec.params, &binding.args)
                    } else {
                        Value::Null
                    };
                    Message::response(message, result)
                }
                Err(reason) => internal_error(message, reason),
            })
        }
        HandlerKind::Deferred(handler) => {
            let deferred =
                DeferredReply::new(message.id().cloned(), ctx.outbound.clone(), ctx.format);
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(&mut binding.args, deferred)));
            match flatten(outcome) {
                Ok(()) => None,
                Err(reason) => Some(internal_error(message, reason)),
            }
        }
    }
}

/// Collapse handler failure and panic into one error description.
fn flatten<T>(
    outcome: std::thread::Result<std::result::Result<T, HandlerError>>,
) -> std::result::Result<T, String> {
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.to_string()),
        Err(_) => Err("handler panicked".to_string()),
    }
}

fn internal_error(message: &Message, reason: String) -> Message {
    tracing::error!(method = message.method().unwrap_or(""), %reason, "handler failed");
    Message::error_response(message, error_codes::INTERNAL_ERROR, reason)
}

/// Output object for a void handler: out/in-out argument slots by name.
fn gather_outputs(params: &[ParamSpec], args: &[Value]) -> Value {
    let outputs: Map<String, Value> = params
        .iter()
        .zip(args)
        .filter(|(param, _)| param.dir() != ParamDir::In)
        .map(|(param, arg)| (param.name().to_string(), arg.clone()))
        .collect();

    if outputs.is_empty() {
        Value::Null
    } else {
        Value::Object(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageType, RequestId};
    use std::sync::{Arc, Mutex};

    fn context() -> (DispatchContext, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(8);
        (
            DispatchContext {
                outbound: tx,
                format: WireFormat::Compact,
            },
            rx,
        )
    }

    fn registry_with(service: &Arc<Service>) -> RwLock<ServiceRegistry> {
        let mut registry = ServiceRegistry::new();
        assert!(registry.add_service(service));
        RwLock::new(registry)
    }

    /// Mirror of the reference service the integration scenarios exercise.
    fn test_service() -> Arc<Service> {
        Service::builder("service")
            .method_void("noParam", vec![], |_| Ok(Value::Null))
            .method(
                "singleParam",
                vec![ParamSpec::new("string", ParamKind::String)],
                |args| Ok(args[0].clone()),
            )
            .method(
                "multipleParam",
                vec![
                    ParamSpec::new("first", ParamKind::String),
                    ParamSpec::new("second", ParamKind::String),
                    ParamSpec::new("third", ParamKind::String),
                ],
                |args| {
                    let joined = args
                        .iter()
                        .map(|v| v.as_str().unwrap_or(""))
                        .collect::<String>();
                    Ok(json!(joined))
                },
            )
            .method(
                "variantParameter",
                vec![ParamSpec::new("variantParam", ParamKind::Variant)],
                |args| Ok(json!(args[0].as_bool().unwrap_or(false))),
            )
            .method(
                "variantListParameter",
                vec![ParamSpec::new("data", ParamKind::VariantList)],
                |args| Ok(args[0].clone()),
            )
            .method("variantStringResult", vec![], |_| Ok(json!("hello")))
            .method(
                "variantMapInvalidParam",
                vec![ParamSpec::new("map", ParamKind::VariantMap)],
                |args| Ok(args[0].get("foo").cloned().unwrap_or(Value::Null)),
            )
            .method(
                "methodWithListOfInts",
                vec![ParamSpec::new(
                    "list",
                    ParamKind::List(Box::new(ParamKind::Int)),
                )],
                |args| {
                    let list = args[0].as_array().cloned().unwrap_or_default();
                    let expected = [300, 30, 3];
                    let matches = list.len() >= 3
                        && expected
                            .iter()
                            .zip(&list)
                            .all(|(want, got)| got.as_i64() == Some(*want));
                    Ok(json!(matches))
                },
            )
            .method(
                "overloadedMethod",
                vec![ParamSpec::new("input", ParamKind::Int)],
                |_| Ok(json!(true)),
            )
            .method(
                "overloadedMethod",
                vec![ParamSpec::new("input", ParamKind::String)],
                |_| Ok(json!(false)),
            )
            .method(
                "outputParameter",
                vec![
                    ParamSpec::new("in1", ParamKind::Int),
                    ParamSpec::new("in2", ParamKind::Int),
                    ParamSpec::new("out", ParamKind::Int).in_out(),
                ],
                |args| {
                    let sum: i64 = args.iter().filter_map(Value::as_i64).sum();
                    Ok(json!(sum))
                },
            )
            .build()
    }

    fn call(registry: &RwLock<ServiceRegistry>, request: &Message) -> Message {
        let (ctx, _rx) = context();
        dispatch(registry, request, &ctx).expect("a request always gets a reply")
    }

    #[test]
    fn test_no_param_call_yields_null_result() {
        let registry = registry_with(&test_service());
        let request = Message::request("service.noParam");
        let reply = call(&registry, &request);

        assert_eq!(reply.message_type(), MessageType::Response);
        assert_eq!(reply.result(), Some(&Value::Null));
        assert_eq!(reply.id(), request.id());
    }

    #[test]
    fn test_args_to_zero_parameter_handler_are_invalid_params() {
        let registry = registry_with(&test_service());
        let request = Message::request_with("service.noParam", json!([false]));
        let reply = call(&registry, &request);

        assert_eq!(reply.error_code(), Some(error_codes::INVALID_PARAMS));
        assert_eq!(reply.id(), request.id());
    }

    #[test]
    fn test_single_param_echo() {
        let registry = registry_with(&test_service());
        let request = Message::request_with("service.singleParam", "single");
        let reply = call(&registry, &request);
        assert_eq!(reply.result(), Some(&json!("single")));
    }

    #[test]
    fn test_multiple_param_concatenation() {
        let registry = registry_with(&test_service());
        let request = Message::request_with("service.multipleParam", json!(["a", "b", "c"]));
        let reply = call(&registry, &request);
        assert_eq!(reply.result(), Some(&json!("abc")));
    }

    #[test]
    fn test_variant_parameter_accepts_any_value() {
        let registry = registry_with(&test_service());
        let request = Message::request_with("service.variantParameter", json!([true]));
        assert_eq!(call(&registry, &request).result(), Some(&json!(true)));
    }

    #[test]
    fn test_variant_list_roundtrips_mixed_types() {
        let registry = registry_with(&test_service());
        let data = json!([1, 20, "hello", false]);
        let request =
            Message::request_with("service.variantListParameter", json!([data.clone()]));
        assert_eq!(call(&registry, &request).result(), Some(&data));
    }

    #[test]
    fn test_method_not_found() {
        let registry = registry_with(&test_service());
        let request = Message::request("service.doesNotExist");
        let reply = call(&registry, &request);
        assert_eq!(reply.error_code(), Some(error_codes::METHOD_NOT_FOUND));
        assert_eq!(reply.id(), request.id());
    }

    #[test]
    fn test_unknown_service_prefix_not_found() {
        let registry = registry_with(&test_service());
        let request = Message::request("nosuch.method");
        let reply = call(&registry, &request);
        assert_eq!(reply.error_code(), Some(error_codes::METHOD_NOT_FOUND));
    }

    #[test]
    fn test_overload_picked_by_argument_type() {
        let registry = registry_with(&test_service());

        let int_request = Message::request_with("service.overloadedMethod", 10);
        assert_eq!(call(&registry, &int_request).result(), Some(&json!(true)));

        let string_request = Message::request_with("service.overloadedMethod", "single");
        assert_eq!(
            call(&registry, &string_request).result(),
            Some(&json!(false))
        );

        let map_request = Message::request_with(
            "service.overloadedMethod",
            json!({"one": 1, "two": 2, "three": 3}),
        );
        let reply = call(&registry, &map_request);
        assert_eq!(reply.error_code(), Some(error_codes::INVALID_PARAMS));
        assert_eq!(reply.id(), map_request.id());
    }

    #[test]
    fn test_exact_match_outranks_widening() {
        // Float-first registration would win a registration-order tie; the
        // exact Int match must still take the integer call.
        let service = Service::builder("rank")
            .method(
                "pick",
                vec![ParamSpec::new("x", ParamKind::Float)],
                |_| Ok(json!("float")),
            )
            .method("pick", vec![ParamSpec::new("x", ParamKind::Int)], |_| {
                Ok(json!("int"))
            })
            .build();
        let registry = registry_with(&service);

        let request = Message::request_with("rank.pick", 5);
        assert_eq!(call(&registry, &request).result(), Some(&json!("int")));

        let request = Message::request_with("rank.pick", 2.5);
        assert_eq!(call(&registry, &request).result(), Some(&json!("float")));
    }

    #[test]
    fn test_fewer_defaults_outranks_more() {
        let service = Service::builder("rank")
            .method(
                "greet",
                vec![
                    ParamSpec::new("name", ParamKind::String),
                    ParamSpec::new("year", ParamKind::Int).with_default(2012),
                ],
                |_| Ok(json!("two-arg")),
            )
            .method(
                "greet",
                vec![ParamSpec::new("name", ParamKind::String)],
                |_| Ok(json!("one-arg")),
            )
            .build();
        let registry = registry_with(&service);

        let request = Message::request_with("rank.greet", "matt");
        assert_eq!(call(&registry, &request).result(), Some(&json!("one-arg")));
    }

    #[test]
    fn test_registration_order_breaks_remaining_ties() {
        let service = Service::builder("rank")
            .method("same", vec![ParamSpec::new("x", ParamKind::Int)], |_| {
                Ok(json!("first"))
            })
            .method("same", vec![ParamSpec::new("x", ParamKind::Int)], |_| {
                Ok(json!("second"))
            })
            .build();
        let registry = registry_with(&service);

        let request = Message::request_with("rank.same", 1);
        assert_eq!(call(&registry, &request).result(), Some(&json!("first")));
    }

    #[test]
    fn test_default_parameters_fill_unsupplied_tail() {
        let service = Service::builder("service")
            .method(
                "testMethod",
                vec![ParamSpec::new("name", ParamKind::String).with_default("")],
                |args| {
                    let name = args[0].as_str().unwrap_or("");
                    if name.is_empty() {
                        Ok(json!("empty string"))
                    } else {
                        Ok(json!(format!("hello {}", name)))
                    }
                },
            )
            .method(
                "testMethod2",
                vec![
                    ParamSpec::new("name", ParamKind::String).with_default(""),
                    ParamSpec::new("year", ParamKind::Int).with_default(2012),
                ],
                |args| {
                    Ok(json!(format!(
                        "{}{}",
                        args[0].as_str().unwrap_or(""),
                        args[1].as_i64().unwrap_or(0)
                    )))
                },
            )
            .build();
        let registry = registry_with(&service);

        let bare = Message::request("service.testMethod");
        assert_eq!(call(&registry, &bare).result(), Some(&json!("empty string")));

        let named = Message::request_with("service.testMethod", "matt");
        assert_eq!(call(&registry, &named).result(), Some(&json!("hello matt")));

        let kony = Message::request_with("service.testMethod2", "KONY");
        assert_eq!(call(&registry, &kony).result(), Some(&json!("KONY2012")));
    }

    #[test]
    fn test_output_parameter_array_and_object_forms() {
        let registry = registry_with(&test_service());

        let positional = Message::request_with("service.outputParameter", json!([1, 0, 2]));
        assert_eq!(call(&registry, &positional).result(), Some(&json!(3)));

        let named = Message::request_with("service.outputParameter", json!({"in1": 1, "in2": 3}));
        assert_eq!(call(&registry, &named).result(), Some(&json!(4)));

        let with_out = Message::request_with(
            "service.outputParameter",
            json!({"in1": 1, "in2": 3, "out": 2}),
        );
        assert_eq!(call(&registry, &with_out).result(), Some(&json!(6)));
    }

    #[test]
    fn test_void_handler_outputs_gathered_for_object_form() {
        let service = Service::builder("service")
            .method_void(
                "splitName",
                vec![
                    ParamSpec::new("full", ParamKind::String),
                    ParamSpec::new("first", ParamKind::String).out(),
                    ParamSpec::new("last", ParamKind::String).out(),
                ],
                |args| {
                    let full = args[0].as_str().unwrap_or("").to_string();
                    let mut parts = full.splitn(2, ' ');
                    args[1] = json!(parts.next().unwrap_or(""));
                    args[2] = json!(parts.next().unwrap_or(""));
                    Ok(Value::Null)
                },
            )
            .build();
        let registry = registry_with(&service);

        let named = Message::request_with("service.splitName", json!({"full": "Ada Lovelace"}));
        assert_eq!(
            call(&registry, &named).result(),
            Some(&json!({"first": "Ada", "last": "Lovelace"}))
        );

        // Positional form keeps the void null result.
        let positional =
            Message::request_with("service.splitName", json!(["Ada Lovelace", "", ""]));
        assert_eq!(call(&registry, &positional).result(), Some(&Value::Null));
    }

    #[test]
    fn test_variant_map_rejects_array_of_objects() {
        let registry = registry_with(&test_service());
        let request = Message::request_with(
            "service.variantMapInvalidParam",
            json!([[{"foo": "bar", "baz": "quux"}, {"foo": "bar"}]]),
        );
        let reply = call(&registry, &request);
        assert_eq!(reply.error_code(), Some(error_codes::INVALID_PARAMS));
        assert_eq!(reply.id(), request.id());
    }

    #[test]
    fn test_list_of_ints_coercion() {
        let registry = registry_with(&test_service());

        let ok = Message::request_with("service.methodWithListOfInts", json!([[300, 30, 3]]));
        assert_eq!(call(&registry, &ok).result(), Some(&json!(true)));

        let not_ints =
            Message::request_with("service.methodWithListOfInts", json!([[300, "30", 3]]));
        assert_eq!(
            call(&registry, &not_ints).error_code(),
            Some(error_codes::INVALID_PARAMS)
        );
    }

    #[test]
    fn test_fractional_number_fails_int_coercion() {
        assert!(coerce(&json!(3.5), &ParamKind::Int).is_none());
        assert_eq!(coerce(&json!(3.0), &ParamKind::Int), Some((json!(3), false)));
        assert_eq!(coerce(&json!(3), &ParamKind::Int), Some((json!(3), true)));
    }

    #[test]
    fn test_bool_coercion_is_strict() {
        assert!(coerce(&json!(1), &ParamKind::Bool).is_none());
        assert!(coerce(&json!("true"), &ParamKind::Bool).is_none());
        assert_eq!(coerce(&json!(true), &ParamKind::Bool), Some((json!(true), true)));
    }

    #[test]
    fn test_notification_produces_no_reply_even_on_error() {
        let registry = registry_with(&test_service());
        let (ctx, _rx) = context();

        let known = Message::notification_with("service.singleParam", "x");
        assert!(dispatch(&registry, &known, &ctx).is_none());

        let unknown = Message::notification("service.doesNotExist");
        assert!(dispatch(&registry, &unknown, &ctx).is_none());
    }

    #[test]
    fn test_handler_failure_maps_to_internal_error() {
        let service = Service::builder("service")
            .method("fails", vec![], |_| {
                Err(HandlerError::new("database exploded"))
            })
            .method("panics", vec![], |_| -> std::result::Result<Value, HandlerError> {
                panic!("boom")
            })
            .build();
        let registry = registry_with(&service);

        let failing = Message::request("service.fails");
        let reply = call(&registry, &failing);
        assert_eq!(reply.error_code(), Some(error_codes::INTERNAL_ERROR));
        assert_eq!(reply.error_message(), Some("database exploded"));

        let panicking = Message::request("service.panics");
        let reply = call(&registry, &panicking);
        assert_eq!(reply.error_code(), Some(error_codes::INTERNAL_ERROR));
        assert_eq!(reply.id(), panicking.id());
    }

    #[tokio::test]
    async fn test_deferred_handler_responds_later() {
        let parked: Arc<Mutex<Option<DeferredReply>>> = Arc::new(Mutex::new(None));
        let slot = parked.clone();

        let service = Service::builder("service")
            .method_deferred("later", vec![], move |_, deferred| {
                *slot.lock().unwrap() = Some(deferred);
                Ok(())
            })
            .build();
        let registry = registry_with(&service);
        let (ctx, mut rx) = context();

        let request = Message::request("service.later");
        // No immediate reply: the handler parked its DeferredReply.
        assert!(dispatch(&registry, &request, &ctx).is_none());

        let deferred = parked.lock().unwrap().take().unwrap();
        deferred.respond(json!("finally")).await.unwrap();

        let bytes = rx.recv().await.unwrap();
        let reply = Message::from_json(&bytes);
        assert_eq!(reply.id(), request.id());
        assert_eq!(reply.result(), Some(&json!("finally")));
    }

    #[test]
    fn test_scalar_wire_params_bind_like_single_element_array() {
        let registry = registry_with(&test_service());
        let request = Message::from_json(
            br#"{"jsonrpc": "2.0", "id": 50, "method": "service.singleParam", "params": "bare"}"#,
        );
        assert_eq!(call(&registry, &request).result(), Some(&json!("bare")));
    }

    #[test]
    fn test_reply_ids_echo_request_id_type() {
        let registry = registry_with(&test_service());
        let request = Message::from_json(
            br#"{"jsonrpc": "2.0", "id": "string-id", "method": "service.variantStringResult"}"#,
        );
        let reply = call(&registry, &request);
        assert_eq!(reply.id(), Some(&RequestId::Str("string-id".to_string())));
        assert_eq!(reply.result(), Some(&json!("hello")));
    }
}
