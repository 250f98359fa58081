use std::io::{self, Write};

use common_base::types::StatusValue;

use crate::json::JsonWriter;

/// write appends the status fields to the currently open object.
pub fn write<W: Write>(json: &mut JsonWriter<W>, v: &StatusValue) -> io::Result<()> {
    match &v.status_code_array {
        Some(codes) => {
            json.start_array_field("statusCodeArray")?;
            for code in codes {
                json.write_i64(*code as i64)?;
            }
            json.end_array()?;
        }
        None => json.i64_field("statusCode", v.status_code as i64)?,
    }

    match &v.timestamp_array {
        Some(timestamps) => {
            json.start_array_field("timestampArray")?;
            for ts in timestamps {
                json.write_i64(ts.epoch())?;
            }
            json.end_array()?;
        }
        None => json.i64_field("lastUpdateTime", v.last_update_time.ms_epoch())?,
    }

    json.i64_field("statusType", v.status_type as i64)?;
    json.string_field("message", &v.message)?;
    json.string_field("application", &v.application)
}

#[cfg(test)]
mod tests {
    use common_base::timestamp::Timestamp;

    use crate::encoder::status::write;
    use crate::encoder::tests::status_value;
    use crate::json::JsonWriter;

    #[test]
    fn test_arrays_replace_scalars() {
        let mut v = status_value(1);
        v.status_code_array = Some(vec![0, 1, 2]);
        v.timestamp_array = Some(vec![Timestamp::from_epoch(10), Timestamp::from_epoch(20)]);

        let mut w = JsonWriter::new(Vec::new());
        w.start_object().unwrap();
        write(&mut w, &v).unwrap();
        w.end_object().unwrap();

        assert_eq!(
            String::from_utf8(w.into_inner()).unwrap(),
            r#"{"statusCodeArray":[0,1,2],"timestampArray":[10,20],"statusType":1,"message":"ok","application":"app"}"#
        );
    }
}
