use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource as semconv;
use relay_config::ExporterConfig;

/// Resource describing this process on exported spans
pub fn build_resource(service_name: &str, exporter: &ExporterConfig) -> Resource {
    let attrs = [
        KeyValue::new(semconv::SERVICE_NAME, service_name.to_owned()),
        KeyValue::new(semconv::SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
    ]
    .into_iter()
    .chain(
        exporter
            .resource_attributes
            .iter()
            .map(|(key, value)| KeyValue::new(key.clone(), value.clone())),
    );

    Resource::builder().with_attributes(attrs).build()
}
