//! 目标地址校验
//!
//! 在创建任务之前规范化并校验用户输入的 URL / IP / 主机名。
//!
//! 规则：
//! - 空串或纯空白直接拒绝
//! - 裸 IPv4（点分十进制）补上 `http://`
//! - 没有 `http://` / `https://` 前缀的输入先补上 `http://`
//! - 主机必须是多级域名（顶级标签为2-6个字母）、`localhost` 或点分 IPv4，
//!   端口可选，路径/查询可选，大小写不敏感

use url::Url;

use crate::errors::{SimulatorError, SimulatorResult};

const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";

/// 校验并规范化目标地址，成功时返回一定带 scheme 的 URL
pub fn validate_target(raw: &str) -> SimulatorResult<String> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(SimulatorError::InvalidTarget("URL不能为空".to_string()));
    }

    let candidate = if has_http_scheme(input) {
        input.to_string()
    } else {
        format!("{HTTP_PREFIX}{input}")
    };

    if candidate.chars().any(char::is_whitespace) {
        return Err(reject(raw));
    }

    let rest = candidate
        .split_once("://")
        .map(|(_, rest)| rest)
        .ok_or_else(|| reject(raw))?;
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let authority = &rest[..authority_end];

    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    };
    if let Some(port) = port {
        if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(reject(raw));
        }
    }
    if !(host.eq_ignore_ascii_case("localhost") || is_ipv4_literal(host) || is_domain_name(host)) {
        return Err(reject(raw));
    }

    // 端口范围、IPv4 每段取值等由 url 解析兜底
    Url::parse(&candidate).map_err(|_| reject(raw))?;

    Ok(candidate)
}

/// 便捷判断，不关心具体错误
pub fn is_valid_target(raw: &str) -> bool {
    validate_target(raw).is_ok()
}

fn reject(raw: &str) -> SimulatorError {
    SimulatorError::InvalidTarget(raw.to_string())
}

fn has_http_scheme(input: &str) -> bool {
    let starts_with = |prefix: &str| {
        input
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    starts_with(HTTP_PREFIX) || starts_with(HTTPS_PREFIX)
}

fn is_ipv4_literal(host: &str) -> bool {
    let parts: Vec<&str> = host.split('.').collect();
    parts.len() == 4
        && parts
            .iter()
            .all(|p| (1..=3).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_digit()))
}

fn is_domain_name(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    let labels: Vec<&str> = host.split('.').collect();
    let Some((tld, names)) = labels.split_last() else {
        return false;
    };
    !names.is_empty()
        && (2..=6).contains(&tld.len())
        && tld.bytes().all(|b| b.is_ascii_alphabetic())
        && names.iter().all(|label| is_dns_label(label))
}

fn is_dns_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            bytes.len() <= 63
                && first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
        }
        _ => false,
    }
}
