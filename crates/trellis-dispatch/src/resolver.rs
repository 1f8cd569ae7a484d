//! Handler argument resolution
//!
//! Each declared parameter is resolved in declaration order, and the first
//! rule that applies wins:
//!
//! 1. the current request or a fresh response builder, by declared type
//! 2. a class type through the container: input validators and model
//!    binders first, then plain resolve-by-type
//! 3. a route parameter with the same name
//! 4. a request attribute with the same name
//! 5. a query parameter with the same name
//! 6. a body field with the same name
//! 7. an uploaded file with the same name
//! 8. the declared default
//! 9. `null` for a nullable parameter
//!
//! A variadic parameter instead collects every route parameter that no
//! earlier parameter consumed.

use crate::coerce::{coerce_str, coerce_value};
use std::collections::HashSet;
use std::sync::Arc;
use trellis_di::{Container, TypeKey};
use trellis_exception::{Error, Result};
use trellis_http::{Request, Response};
use trellis_urls::routers::{Argument, Arguments, ParamDescriptor, Route, TypeTag};

/// Resolves handler arguments against a request and a container
#[derive(Clone)]
pub struct ArgumentResolver {
	container: Arc<dyn Container>,
}

impl ArgumentResolver {
	pub fn new(container: Arc<dyn Container>) -> Self {
		Self { container }
	}

	pub fn container(&self) -> &Arc<dyn Container> {
		&self.container
	}

	/// Resolve one argument per parameter.
	///
	/// `request.path_params` must already hold the bound route parameters.
	/// `route` supplies the parameter order for variadic collection and
	/// the alternate model binding keys.
	///
	/// # Errors
	///
	/// - [`Error::UnresolvableParameter`] when no rule applies
	/// - [`Error::Validation`] when an input validator rejects the request
	/// - [`Error::ModelNotFound`] when a model binder finds no record
	pub async fn resolve(
		&self,
		params: &[ParamDescriptor],
		request: &Request,
		route: Option<&Route>,
	) -> Result<Arguments> {
		let mut arguments = Arguments::new();
		let mut consumed = HashSet::new();

		for (position, param) in params.iter().enumerate() {
			if param.variadic {
				let values = route_parameter_order(request, route)
					.into_iter()
					.filter(|name| !consumed.contains(name))
					.filter_map(|name| request.path_params.get(&name))
					.map(|raw| coerce_str(raw, param))
					.collect();
				arguments.push(&param.name, Argument::Variadic(values));
				continue;
			}

			let resolved = match &param.type_tag {
				TypeTag::Request => Some(Argument::Request(request.clone())),
				TypeTag::ResponseBuilder => Some(Argument::Response(Response::ok())),
				TypeTag::Class(key) => {
					self.resolve_class(key, param, request, route, &mut consumed)
						.await?
				}
				_ => resolve_by_name(param, request, &mut consumed),
			};

			let argument = match resolved {
				Some(argument) => argument,
				None => fallback(param, position, request)?,
			};
			arguments.push(&param.name, argument);
		}

		Ok(arguments)
	}

	async fn resolve_class(
		&self,
		key: &TypeKey,
		param: &ParamDescriptor,
		request: &Request,
		route: Option<&Route>,
		consumed: &mut HashSet<String>,
	) -> Result<Option<Argument>> {
		if let Some(validator) = self.container.input_validator(key) {
			return match validator.validate(request).await {
				Ok(input) => Ok(Some(Argument::Service(input))),
				Err(messages) => {
					tracing::warn!(
						parameter = %param.name,
						input = %key,
						errors = messages.len(),
						"input validation failed"
					);
					Err(Error::Validation(messages))
				}
			};
		}

		if let Some(binder) = self.container.model_binder(key)
			&& let Some(value) = request.path_params.get(&param.name)
		{
			let column = route
				.and_then(|route| route.binding_key(&param.name))
				.unwrap_or_else(|| binder.primary_key())
				.to_string();
			consumed.insert(param.name.clone());
			return match binder.find(&column, value).await? {
				Some(model) => Ok(Some(Argument::Service(model))),
				None => {
					tracing::debug!(
						model = %binder.model_name(),
						key = %column,
						value = %value,
						"model binding found no record"
					);
					Err(Error::ModelNotFound {
						model: binder.model_name().to_string(),
						key: column,
						value: value.clone(),
					})
				}
			};
		}

		Ok(self.container.resolve(key).map(Argument::Service))
	}
}

fn resolve_by_name(
	param: &ParamDescriptor,
	request: &Request,
	consumed: &mut HashSet<String>,
) -> Option<Argument> {
	let name = param.name.as_str();

	if let Some(raw) = request.path_params.get(name) {
		consumed.insert(param.name.clone());
		return Some(Argument::Value(coerce_str(raw, param)));
	}
	if let Some(value) = request.attributes.get(name) {
		return Some(Argument::Value(coerce_value(value.clone(), param)));
	}
	if let Some(raw) = request.query_params.get(name) {
		return Some(Argument::Value(coerce_str(raw, param)));
	}
	if let Some(value) = request.body_params.get(name) {
		return Some(Argument::Value(coerce_value(value.clone(), param)));
	}
	request
		.files
		.get(name)
		.map(|file| Argument::File(file.clone()))
}

fn fallback(param: &ParamDescriptor, position: usize, request: &Request) -> Result<Argument> {
	if let Some(default) = &param.default {
		return Ok(Argument::Value(default.clone()));
	}
	if param.nullable {
		return Ok(Argument::Null);
	}

	let available_sources = available_sources(request);
	tracing::warn!(
		parameter = %param.name,
		position,
		declared = %param.type_tag.name(),
		sources = %available_sources.join(", "),
		"unable to resolve handler parameter"
	);
	Err(Error::UnresolvableParameter {
		name: param.name.clone(),
		position,
		available_sources,
	})
}

/// Non-empty sources a parameter could have been bound from
fn available_sources(request: &Request) -> Vec<String> {
	[
		("route", request.path_params.is_empty()),
		("attributes", request.attributes.is_empty()),
		("query", request.query_params.is_empty()),
		("body", request.body_params.is_empty()),
		("files", request.files.is_empty()),
	]
	.into_iter()
	.filter(|(_, empty)| !empty)
	.map(|(source, _)| source.to_string())
	.collect()
}

/// Route parameter names in template order, path before domain
fn route_parameter_order(request: &Request, route: Option<&Route>) -> Vec<String> {
	match route {
		Some(route) => route
			.parameter_names()
			.into_iter()
			.map(str::to_string)
			.collect(),
		None => {
			let mut names: Vec<String> = request.path_params.keys().cloned().collect();
			names.sort();
			names
		}
	}
}
