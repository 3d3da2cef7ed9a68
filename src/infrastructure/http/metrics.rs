//! HTTP Metrics
//!
//! 请求计数与延迟直方图，以 Prometheus 文本格式暴露在 `/metrics`。
//!
//! - `<ns>_requests_total{method,path,status}` counter
//! - `<ns>_request_duration_seconds{method,path}` histogram
//!
//! `path` 标签取路由模板（如 `/echo/:name`），未匹配任何路由时为 `unmatched`，
//! 避免路径参数撑爆标签基数。

use std::fmt::Write as _;
use std::time::Duration;

use dashmap::DashMap;

/// 指标端点路径
pub const METRICS_PATH: &str = "/metrics";

/// 未匹配路由时的 path 标签
pub const UNMATCHED_PATH: &str = "unmatched";

/// Prometheus 客户端的缺省桶（秒）
pub const DEFAULT_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct RequestKey {
    method: String,
    path: String,
    status: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct RouteKey {
    method: String,
    path: String,
}

#[derive(Debug, Clone)]
struct Histogram {
    bucket_counts: Vec<u64>,
    count: u64,
    sum: f64,
}

impl Histogram {
    fn new(buckets: usize) -> Self {
        Self {
            bucket_counts: vec![0; buckets],
            count: 0,
            sum: 0.0,
        }
    }

    fn observe(&mut self, bounds: &[f64], value: f64) {
        for (slot, bound) in self.bucket_counts.iter_mut().zip(bounds) {
            if value <= *bound {
                *slot += 1;
            }
        }
        self.count += 1;
        self.sum += value;
    }
}

/// 请求指标收集器
#[derive(Debug)]
pub struct HttpMetrics {
    namespace: String,
    buckets: Vec<f64>,
    requests: DashMap<RequestKey, u64>,
    durations: DashMap<RouteKey, Histogram>,
}

impl HttpMetrics {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            buckets: DEFAULT_BUCKETS.to_vec(),
            requests: DashMap::new(),
            durations: DashMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// 记录一次请求
    pub fn observe(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        let key = RequestKey {
            method: method.to_string(),
            path: path.to_string(),
            status,
        };
        *self.requests.entry(key).or_insert(0) += 1;

        let route = RouteKey {
            method: method.to_string(),
            path: path.to_string(),
        };
        let buckets = self.buckets.len();
        self.durations
            .entry(route)
            .or_insert_with(|| Histogram::new(buckets))
            .observe(&self.buckets, elapsed.as_secs_f64());
    }

    /// 某个 method + path + status 的累计请求数
    pub fn request_count(&self, method: &str, path: &str, status: u16) -> u64 {
        let key = RequestKey {
            method: method.to_string(),
            path: path.to_string(),
            status,
        };
        self.requests.get(&key).map(|v| *v).unwrap_or(0)
    }

    /// 渲染 Prometheus 文本格式
    pub fn render(&self) -> String {
        let mut out = String::new();

        let requests_name = format!("{}_requests_total", self.namespace);
        write_metric_header(&mut out, &requests_name, "Total HTTP requests", "counter");
        let mut requests: Vec<(RequestKey, u64)> = self
            .requests
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        requests.sort();
        for (key, value) in requests {
            let labels = [
                ("method", key.method),
                ("path", key.path),
                ("status", key.status.to_string()),
            ];
            append_line(&mut out, &requests_name, &labels, &value.to_string());
        }

        let duration_name = format!("{}_request_duration_seconds", self.namespace);
        write_metric_header(
            &mut out,
            &duration_name,
            "HTTP request latency in seconds",
            "histogram",
        );
        let mut durations: Vec<(RouteKey, Histogram)> = self
            .durations
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        durations.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, histogram) in durations {
            append_histogram(&mut out, &duration_name, &key, &self.buckets, &histogram);
        }

        out
    }
}

fn write_metric_header(out: &mut String, name: &str, help: &str, metric_type: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {metric_type}");
}

fn append_line(out: &mut String, name: &str, labels: &[(&str, String)], value: &str) {
    let rendered = labels
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", escape_label_value(v)))
        .collect::<Vec<_>>()
        .join(",");
    let _ = writeln!(out, "{name}{{{rendered}}} {value}");
}

fn append_histogram(
    out: &mut String,
    name: &str,
    route: &RouteKey,
    bounds: &[f64],
    histogram: &Histogram,
) {
    let bucket_name = format!("{name}_bucket");
    for (bound, count) in bounds.iter().zip(&histogram.bucket_counts) {
        let labels = [
            ("method", route.method.clone()),
            ("path", route.path.clone()),
            ("le", bound.to_string()),
        ];
        append_line(out, &bucket_name, &labels, &count.to_string());
    }

    let labels = [
        ("method", route.method.clone()),
        ("path", route.path.clone()),
        ("le", "+Inf".to_string()),
    ];
    append_line(out, &bucket_name, &labels, &histogram.count.to_string());

    let labels = [
        ("method", route.method.clone()),
        ("path", route.path.clone()),
    ];
    append_line(out, &format!("{name}_sum"), &labels, &histogram.sum.to_string());
    append_line(
        out,
        &format!("{name}_count"),
        &labels,
        &histogram.count.to_string(),
    );
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_lines() {
        let metrics = HttpMetrics::new("demo");
        metrics.observe("GET", "/ping", 200, Duration::from_millis(3));
        metrics.observe("GET", "/ping", 200, Duration::from_millis(4));
        metrics.observe("GET", UNMATCHED_PATH, 404, Duration::from_millis(1));

        assert_eq!(metrics.request_count("GET", "/ping", 200), 2);
        let text = metrics.render();
        assert!(text.contains("# TYPE demo_requests_total counter"));
        assert!(text.contains(r#"demo_requests_total{method="GET",path="/ping",status="200"} 2"#));
        assert!(
            text.contains(r#"demo_requests_total{method="GET",path="unmatched",status="404"} 1"#)
        );
    }

    #[test]
    fn test_histogram_buckets_are_cumulative() {
        let metrics = HttpMetrics::new("demo");
        metrics.observe("POST", "/echo", 200, Duration::from_millis(20));
        metrics.observe("POST", "/echo", 200, Duration::from_secs(3));

        let text = metrics.render();
        assert!(text.contains("# TYPE demo_request_duration_seconds histogram"));
        assert!(text.contains(
            r#"demo_request_duration_seconds_bucket{method="POST",path="/echo",le="0.005"} 0"#
        ));
        assert!(text.contains(
            r#"demo_request_duration_seconds_bucket{method="POST",path="/echo",le="0.025"} 1"#
        ));
        assert!(text.contains(
            r#"demo_request_duration_seconds_bucket{method="POST",path="/echo",le="5"} 2"#
        ));
        assert!(text.contains(
            r#"demo_request_duration_seconds_bucket{method="POST",path="/echo",le="+Inf"} 2"#
        ));
        assert!(
            text.contains(r#"demo_request_duration_seconds_count{method="POST",path="/echo"} 2"#)
        );
    }

    #[test]
    fn test_label_escaping() {
        assert_eq!(escape_label_value(r#"a"b\c"#), r#"a\"b\\c"#);
    }
}
