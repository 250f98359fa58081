use std::io::{self, Write};

use common_base::types::EventsValue;
use serde_json::Value;

use crate::json::JsonWriter;

/// write appends the event fields to the currently open object. Timestamps are
/// written as strings of epoch seconds and additional properties are
/// stringified.
pub fn write<W: Write>(json: &mut JsonWriter<W>, v: &EventsValue) -> io::Result<()> {
    json.string_field("namespace", &v.namespace)?;
    json.string_field("source", &v.source)?;
    json.string_field("title", &v.title)?;
    json.string_field("message", &v.message)?;
    json.string_field("priority", &v.priority)?;
    json.string_field("timestamp", &v.timestamp.epoch().to_string())?;
    json.string_field("endTimestamp", &v.end_timestamp.epoch().to_string())?;
    json.string_field("userId", &v.user_id)?;
    json.bool_field("ongoing", v.ongoing)?;
    json.string_field("eventId", &v.event_id)?;

    if let Some(ids) = &v.parent_id {
        write_ids(json, "parentId", ids)?;
    }
    if let Some(ids) = &v.child_id {
        write_ids(json, "childId", ids)?;
    }

    if let Some(props) = &v.additional_props {
        json.start_object_field("additionalProps")?;
        for (k, prop) in props {
            match prop {
                Value::String(s) => json.string_field(k, s)?,
                other => json.string_field(k, &other.to_string())?,
            }
        }
        json.end_object()?;
    }
    Ok(())
}

fn write_ids<W: Write>(json: &mut JsonWriter<W>, name: &str, ids: &[String]) -> io::Result<()> {
    json.start_array_field(name)?;
    for id in ids {
        json.write_string(id)?;
    }
    json.end_array()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use common_base::timestamp::Timestamp;
    use common_base::types::EventsValue;
    use serde_json::json;

    use crate::encoder::event::write;
    use crate::json::JsonWriter;

    #[test]
    fn test_event_fields() {
        let mut props = BTreeMap::new();
        props.insert("build".to_string(), json!(42));
        props.insert("env".to_string(), json!("prod"));

        let v = EventsValue {
            namespace: "ns".to_string(),
            source: "ci".to_string(),
            title: "deploy".to_string(),
            message: "rolled out".to_string(),
            priority: "low".to_string(),
            timestamp: Timestamp::from_epoch(100),
            end_timestamp: Timestamp::from_epoch(160),
            user_id: "u1".to_string(),
            ongoing: true,
            event_id: "e1".to_string(),
            parent_id: Some(vec!["p1".to_string()]),
            child_id: None,
            additional_props: Some(props),
        };

        let mut w = JsonWriter::new(Vec::new());
        w.start_object().unwrap();
        write(&mut w, &v).unwrap();
        w.end_object().unwrap();

        assert_eq!(
            String::from_utf8(w.into_inner()).unwrap(),
            concat!(
                r#"{"namespace":"ns","source":"ci","title":"deploy","message":"rolled out","#,
                r#""priority":"low","timestamp":"100","endTimestamp":"160","userId":"u1","#,
                r#""ongoing":true,"eventId":"e1","parentId":["p1"],"#,
                r#""additionalProps":{"build":"42","env":"prod"}}"#
            )
        );
    }
}
