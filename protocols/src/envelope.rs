//! SOAP 1.2 / WS-Management envelope construction.
//!
//! Envelopes are assembled textually; the response side is where real
//! parsing happens. Enumerations request optimized mode so every instance
//! comes back in the `EnumerateResponse` without Pull paging.

use uuid::Uuid;

const SOAP_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
const ADDRESSING_NS: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";
const WSMAN_NS: &str = "http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd";
const ENUMERATION_NS: &str = "http://schemas.xmlsoap.org/ws/2004/09/enumeration";
const IDENTIFY_NS: &str = "http://schemas.dmtf.org/wbem/wsman/identity/1/wsmanidentity.xsd";

const ACTION_GET: &str = "http://schemas.xmlsoap.org/ws/2004/09/transfer/Get";
const ACTION_ENUMERATE: &str = "http://schemas.xmlsoap.org/ws/2004/09/enumeration/Enumerate";

const ANONYMOUS_ADDRESS: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous";

/// Cap for optimized enumerations. Controllers report at most a few dozen
/// instances per resource class.
const MAX_ELEMENTS: u32 = 32_000;

pub fn identify() -> String {
    format!(
        r#"<s:Envelope xmlns:s="{SOAP_NS}"><s:Header/><s:Body><wsmid:Identify xmlns:wsmid="{IDENTIFY_NS}"/></s:Body></s:Envelope>"#
    )
}

pub fn get(to: &str, resource: &str, selectors: &[(&str, &str)]) -> String {
    build(to, resource, ACTION_GET, selectors, String::new())
}

pub fn enumerate(to: &str, resource: &str, selectors: &[(&str, &str)]) -> String {
    let body = format!(
        "<n:Enumerate><w:OptimizeEnumeration/><w:MaxElements>{MAX_ELEMENTS}</w:MaxElements></n:Enumerate>"
    );
    build(to, resource, ACTION_ENUMERATE, selectors, body)
}

pub fn invoke(
    to: &str,
    resource: &str,
    method: &str,
    selectors: &[(&str, &str)],
    params: &[(&str, &str)],
) -> String {
    let action = format!("{resource}/{method}");
    let mut input = String::new();
    for (name, value) in params {
        let name = escape(name);
        let value = escape(value);
        input.push_str(&format!("<p:{name}>{value}</p:{name}>"));
    }
    let body = format!(
        r#"<p:{method}_INPUT xmlns:p="{resource}">{input}</p:{method}_INPUT>"#,
        resource = escape(resource),
    );
    build(to, resource, &action, selectors, body)
}

fn build(to: &str, resource: &str, action: &str, selectors: &[(&str, &str)], body: String) -> String {
    let message_id = Uuid::new_v4();
    let selector_set = selector_set(selectors);
    format!(
        r#"<s:Envelope xmlns:s="{SOAP_NS}" xmlns:a="{ADDRESSING_NS}" xmlns:w="{WSMAN_NS}" xmlns:n="{ENUMERATION_NS}"><s:Header><a:To s:mustUnderstand="true">{to}</a:To><w:ResourceURI s:mustUnderstand="true">{resource}</w:ResourceURI><a:ReplyTo><a:Address s:mustUnderstand="true">{ANONYMOUS_ADDRESS}</a:Address></a:ReplyTo><a:Action s:mustUnderstand="true">{action}</a:Action><a:MessageID>uuid:{message_id}</a:MessageID>{selector_set}</s:Header><s:Body>{body}</s:Body></s:Envelope>"#,
        to = escape(to),
        resource = escape(resource),
        action = escape(action),
    )
}

fn selector_set(selectors: &[(&str, &str)]) -> String {
    if selectors.is_empty() {
        return String::new();
    }
    let mut set = String::from("<w:SelectorSet>");
    for (name, value) in selectors {
        set.push_str(&format!(
            r#"<w:Selector Name="{}">{}</w:Selector>"#,
            escape(name),
            escape(value)
        ));
    }
    set.push_str("</w:SelectorSet>");
    set
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "https://10.0.0.1/wsman";
    const RESOURCE: &str = "http://schemas.dell.com/wbem/wscim/1/cim-schema/2/DCIM_SystemView";

    #[test]
    fn identify_carries_the_identity_namespace() {
        let env = identify();
        assert!(env.contains("wsmid:Identify"));
        assert!(env.contains(IDENTIFY_NS));
    }

    #[test]
    fn get_names_endpoint_resource_and_selectors() {
        let env = get(ENDPOINT, RESOURCE, &[("InstanceID", "System.Embedded.1")]);
        assert!(env.contains(ENDPOINT));
        assert!(env.contains(RESOURCE));
        assert!(env.contains(ACTION_GET));
        assert!(env.contains(r#"<w:Selector Name="InstanceID">System.Embedded.1</w:Selector>"#));
    }

    #[test]
    fn enumerate_requests_optimized_mode() {
        let env = enumerate(ENDPOINT, RESOURCE, &[]);
        assert!(env.contains("<w:OptimizeEnumeration/>"));
        assert!(!env.contains("SelectorSet"));
    }

    #[test]
    fn invoke_builds_method_action_and_input() {
        let env = invoke(
            ENDPOINT,
            RESOURCE,
            "SetAttribute",
            &[("Name", "DCIM:NICService")],
            &[("AttributeValue", "PXE")],
        );
        assert!(env.contains(&format!("{RESOURCE}/SetAttribute")));
        assert!(env.contains("<p:SetAttribute_INPUT"));
        assert!(env.contains("<p:AttributeValue>PXE</p:AttributeValue>"));
    }

    #[test]
    fn reserved_characters_are_escaped() {
        let env = get(ENDPOINT, RESOURCE, &[("InstanceID", "a<b&c")]);
        assert!(env.contains("a&lt;b&amp;c"));
    }

    #[test]
    fn message_ids_are_unique_per_envelope() {
        let a = get(ENDPOINT, RESOURCE, &[]);
        let b = get(ENDPOINT, RESOURCE, &[]);
        assert_ne!(a, b);
    }
}
