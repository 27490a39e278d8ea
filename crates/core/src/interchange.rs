//! JSON view of a built script.
//!
//! Object keys come out sorted, so two builds of the same script
//! serialize byte-for-byte identically.

use crate::model::Element;
use crate::script::Script;
use serde_json::{json, Map, Value};

pub fn to_json(script: &Script) -> Value {
    let attributes: Map<String, Value> = script
        .all_attributes()
        .iter()
        .map(|(name, attrs)| (name.clone(), json!(attrs)))
        .collect();
    json!({
        "namespace": script.namespace(),
        "local": script.local_name(),
        "vms": elements(script.vms()),
        "nodes": elements(script.nodes()),
        "attributes": attributes,
        "constraints": script
            .constraints()
            .iter()
            .map(|c| c.to_json_value())
            .collect::<Vec<_>>(),
        "dependencies": script
            .dependencies()
            .iter()
            .map(|d| d.id())
            .collect::<Vec<_>>(),
    })
}

fn elements(list: &[Element]) -> Vec<Value> {
    list.iter()
        .map(|e| json!({ "id": e.id(), "name": e.to_string() }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ScriptBuilder;

    #[test]
    fn json_view_of_a_script() {
        let script = ScriptBuilder::new()
            .build(
                "namespace dc.web;\n\
                 @N1 : defaultNode;\n\
                 VM1 : tiny<clone, boot=5>;\n\
                 >>ban(VM1, @N1);",
            )
            .unwrap();
        let v = to_json(&script);
        assert_eq!(v["namespace"], "dc.web");
        assert_eq!(v["local"], "web");
        assert_eq!(v["vms"][0]["name"], "dc.web.VM1");
        assert_eq!(v["nodes"][0]["name"], "@N1");
        assert_eq!(
            v["attributes"]["dc.web.VM1"],
            json!({ "boot": "5", "clone": "true", "template": "tiny" })
        );
        assert_eq!(v["constraints"][0]["kind"], "ban");
        assert_eq!(v["constraints"][0]["continuous"], true);
        assert_eq!(v["constraints"][0]["nodes"], json!(["@N1"]));
        assert_eq!(v["dependencies"], json!([]));
    }
}
