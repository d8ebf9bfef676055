//! Search helpers over protocol response documents.
//!
//! WS-Management bodies are heavily namespaced and the prefixes vary by
//! firmware revision, so all matching here is by local element name only.
//! Parent/child traversal comes from [`roxmltree::Node`] itself.

use roxmltree::Node;

/// First descendant element named `tag`, in document order.
pub fn first<'a, 'input>(root: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    root.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
}

/// Every descendant element named `tag`, in document order.
pub fn all<'a, 'input>(root: Node<'a, 'input>, tag: &str) -> Vec<Node<'a, 'input>> {
    root.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == tag)
        .collect()
}

/// First descendant element carrying attribute `name` equal to `value`.
pub fn first_with_attr<'a, 'input>(
    root: Node<'a, 'input>,
    name: &str,
    value: &str,
) -> Option<Node<'a, 'input>> {
    root.descendants()
        .find(|n| n.is_element() && n.attribute(name) == Some(value))
}

/// First descendant element whose trimmed text equals `content`.
pub fn first_with_text<'a, 'input>(
    root: Node<'a, 'input>,
    content: &str,
) -> Option<Node<'a, 'input>> {
    root.descendants()
        .find(|n| n.is_element() && text(*n) == content)
}

/// Trimmed text content of an element, or the empty string.
pub fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().map(str::trim).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
        <n1:Envelope xmlns:n1="urn:a" xmlns:n2="urn:b">
          <n1:Body>
            <n2:DCIM_CPUView>
              <n2:NumberOfEnabledCores> 4 </n2:NumberOfEnabledCores>
            </n2:DCIM_CPUView>
            <n2:DCIM_CPUView>
              <n2:NumberOfEnabledCores>8</n2:NumberOfEnabledCores>
            </n2:DCIM_CPUView>
            <n2:Selector Name="InstanceID">JID_001</n2:Selector>
          </n1:Body>
        </n1:Envelope>"#;

    #[test]
    fn search_ignores_namespace_prefixes() {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        assert!(first(doc.root(), "DCIM_CPUView").is_some());
        assert_eq!(all(doc.root(), "DCIM_CPUView").len(), 2);
        assert!(first(doc.root(), "DCIM_NICView").is_none());
    }

    #[test]
    fn text_is_trimmed() {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        let cores = first(doc.root(), "NumberOfEnabledCores").unwrap();
        assert_eq!(text(cores), "4");
    }

    #[test]
    fn attribute_and_content_lookups() {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        let selector = first_with_attr(doc.root(), "Name", "InstanceID").unwrap();
        assert_eq!(text(selector), "JID_001");
        assert!(first_with_text(doc.root(), "JID_001").is_some());
        assert!(first_with_text(doc.root(), "JID_002").is_none());
    }

    #[test]
    fn scoped_search_stays_within_the_subtree() {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        let second = all(doc.root(), "DCIM_CPUView")[1];
        let cores = first(second, "NumberOfEnabledCores").unwrap();
        assert_eq!(text(cores), "8");
    }
}
