//! Process-wide logging: JSON lines on stdout filtered by [app_env::LOG_LEVEL], plus optional
//! OTLP export of spans and metrics when collector endpoints are configured.

use crate::app_env;
use anyhow::Context;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use opentelemetry::trace::TracerProvider;
use opentelemetry::{KeyValue, global};
use opentelemetry_http::HeaderExtractor;
use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::Tracer;
use opentelemetry_sdk::{Resource, runtime};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing::{Span, debug, field, info_span};
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer, OpenTelemetrySpanExt};
use tracing_subscriber::{EnvFilter, prelude::*, registry};

const SERVICE_NAME: &str = "todo-manager";

/// Background exporters shipping spans and metrics to an OpenTelemetry collector
pub struct Telemetry {
    tracer: Tracer,
    meter_provider: SdkMeterProvider,
}

impl Telemetry {
    /// Builds gRPC exporters for the given collector endpoints (usually `http://localhost:4317`
    /// for a sidecar). Must be called from inside the tokio runtime.
    pub fn export_to(span_endpoint: &str, metric_endpoint: &str) -> Result<Self, anyhow::Error> {
        let span_exporter = SpanExporter::builder()
            .with_tonic()
            .with_endpoint(span_endpoint)
            .build()
            .context("building span exporter")?;
        let metric_exporter = MetricExporter::builder()
            .with_tonic()
            .with_endpoint(metric_endpoint)
            .build()
            .context("building metric exporter")?;

        let tracer = opentelemetry_sdk::trace::TracerProvider::builder()
            .with_batch_exporter(span_exporter, runtime::Tokio)
            .with_resource(service_resource())
            .build()
            .tracer(SERVICE_NAME);
        let meter_provider = SdkMeterProvider::builder()
            .with_reader(PeriodicReader::builder(metric_exporter, runtime::Tokio).build())
            .with_resource(service_resource())
            .build();

        Ok(Telemetry {
            tracer,
            meter_provider,
        })
    }
}

fn service_resource() -> Resource {
    Resource::new([KeyValue::new("service.name", SERVICE_NAME)])
}

/// Reads per-module log directives from [app_env::LOG_LEVEL], defaulting to "info"
pub fn log_filter() -> Result<EnvFilter, anyhow::Error> {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(app_env::LOG_LEVEL)
        .from_env()
        .with_context(|| format!("{} is not a valid log filter", app_env::LOG_LEVEL))
}

/// Installs the global subscriber. `log_filter` only applies to stdout; exported telemetry gets
/// everything at debug and above.
pub fn install_subscriber(log_filter: EnvFilter, telemetry: Option<Telemetry>) {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let (span_layer, metrics_layer) = telemetry
        .map(|telemetry| {
            (
                OpenTelemetryLayer::new(telemetry.tracer),
                MetricsLayer::new(telemetry.meter_provider),
            )
        })
        .unzip();

    registry()
        .with(LevelFilter::DEBUG)
        .with(span_layer)
        .with(metrics_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_filter(log_filter),
        )
        .init();
}

/// Wraps every request in a span, continuing the caller's trace when a `traceparent` header
/// is present
pub fn trace_requests<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(record_response),
        ),
    )
}

fn request_span(request: &Request<Body>) -> Span {
    let span = info_span!(
        "http_request",
        method = %request.method(),
        path = request.uri().path(),
        status = field::Empty,
        latency_ms = field::Empty,
    );

    let caller_context = global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(request.headers()))
    });
    span.set_parent(caller_context);

    span
}

fn record_response(response: &Response<Body>, latency: Duration, span: &Span) {
    span.record("status", response.status().as_u16());
    span.record("latency_ms", latency.as_millis() as u64);
    debug!("request complete");
}
