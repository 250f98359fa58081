use std::io::{self, Write};

use common_base::types::NumericValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy)]
struct Scope {
    kind: ScopeKind,
    count: usize,
}

/// JsonWriter is an append-only streaming JSON generator. It tracks the open
/// objects and arrays so separators are placed automatically; misuse such as
/// closing the wrong scope is reported as `InvalidInput`.
pub struct JsonWriter<W: Write> {
    out: W,
    scopes: Vec<Scope>,
    field_pending: bool,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            scopes: Vec::new(),
            field_pending: false,
        }
    }

    /// object_fragment builds a writer positioned inside an object that is never
    /// opened nor closed, producing `"k":v,"k2":v2` fragments.
    pub fn object_fragment(out: W) -> Self {
        Self {
            out,
            scopes: vec![Scope {
                kind: ScopeKind::Object,
                count: 0,
            }],
            field_pending: false,
        }
    }

    /// array_fragment builds a writer positioned inside an array that is never
    /// opened nor closed, producing `v,v2` fragments.
    pub fn array_fragment(out: W) -> Self {
        Self {
            out,
            scopes: vec![Scope {
                kind: ScopeKind::Array,
                count: 0,
            }],
            field_pending: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn start_object(&mut self) -> io::Result<()> {
        self.before_value()?;
        self.out.write_all(b"{")?;
        self.scopes.push(Scope {
            kind: ScopeKind::Object,
            count: 0,
        });
        Ok(())
    }

    pub fn end_object(&mut self) -> io::Result<()> {
        self.end_scope(ScopeKind::Object)?;
        self.out.write_all(b"}")
    }

    pub fn start_array(&mut self) -> io::Result<()> {
        self.before_value()?;
        self.out.write_all(b"[")?;
        self.scopes.push(Scope {
            kind: ScopeKind::Array,
            count: 0,
        });
        Ok(())
    }

    pub fn end_array(&mut self) -> io::Result<()> {
        self.end_scope(ScopeKind::Array)?;
        self.out.write_all(b"]")
    }

    pub fn field_name(&mut self, name: &str) -> io::Result<()> {
        if self.field_pending {
            return Err(usage("field name written while a value was expected"));
        }
        match self.scopes.last_mut() {
            Some(scope) if scope.kind == ScopeKind::Object => {
                if scope.count > 0 {
                    self.out.write_all(b",")?;
                }
                scope.count += 1;
            }
            _ => return Err(usage("field name written outside of an object")),
        }
        self.write_escaped(name)?;
        self.out.write_all(b":")?;
        self.field_pending = true;
        Ok(())
    }

    pub fn write_string(&mut self, v: &str) -> io::Result<()> {
        self.before_value()?;
        self.write_escaped(v)
    }

    pub fn write_i64(&mut self, v: i64) -> io::Result<()> {
        self.before_value()?;
        write!(self.out, "{}", v)
    }

    /// write_f64 writes the shortest representation that round trips. Values
    /// that JSON can not express are written as the strings `NaN`, `Infinity`
    /// and `-Infinity`.
    pub fn write_f64(&mut self, v: f64) -> io::Result<()> {
        self.before_value()?;
        if v.is_nan() {
            self.out.write_all(b"\"NaN\"")
        } else if v.is_infinite() {
            if v > 0.0 {
                self.out.write_all(b"\"Infinity\"")
            } else {
                self.out.write_all(b"\"-Infinity\"")
            }
        } else {
            serde_json::to_writer(&mut self.out, &v).map_err(io::Error::from)
        }
    }

    pub fn write_numeric(&mut self, v: Option<NumericValue>) -> io::Result<()> {
        match v {
            Some(NumericValue::Integer(v)) => self.write_i64(v),
            Some(NumericValue::Float(v)) => self.write_f64(v),
            None => self.write_null(),
        }
    }

    pub fn write_bool(&mut self, v: bool) -> io::Result<()> {
        self.before_value()?;
        self.out.write_all(if v { b"true" } else { b"false" })
    }

    pub fn write_null(&mut self) -> io::Result<()> {
        self.before_value()?;
        self.out.write_all(b"null")
    }

    /// write_raw_value appends an already encoded JSON value, placing the
    /// separator in front of it like any other value.
    pub fn write_raw_value(&mut self, raw: &[u8]) -> io::Result<()> {
        self.before_value()?;
        self.out.write_all(raw)
    }

    /// write_raw_fields appends already encoded `"k":v` pairs to the open object.
    pub fn write_raw_fields(&mut self, raw: &[u8]) -> io::Result<()> {
        if raw.is_empty() {
            return Ok(());
        }
        if self.field_pending {
            return Err(usage("fields written while a value was expected"));
        }
        match self.scopes.last_mut() {
            Some(scope) if scope.kind == ScopeKind::Object => {
                if scope.count > 0 {
                    self.out.write_all(b",")?;
                }
                scope.count += 1;
            }
            _ => return Err(usage("fields written outside of an object")),
        }
        self.out.write_all(raw)
    }

    pub fn string_field(&mut self, name: &str, v: &str) -> io::Result<()> {
        self.field_name(name)?;
        self.write_string(v)
    }

    pub fn i64_field(&mut self, name: &str, v: i64) -> io::Result<()> {
        self.field_name(name)?;
        self.write_i64(v)
    }

    pub fn bool_field(&mut self, name: &str, v: bool) -> io::Result<()> {
        self.field_name(name)?;
        self.write_bool(v)
    }

    pub fn numeric_field(&mut self, name: &str, v: Option<NumericValue>) -> io::Result<()> {
        self.field_name(name)?;
        self.write_numeric(v)
    }

    pub fn start_object_field(&mut self, name: &str) -> io::Result<()> {
        self.field_name(name)?;
        self.start_object()
    }

    pub fn start_array_field(&mut self, name: &str) -> io::Result<()> {
        self.field_name(name)?;
        self.start_array()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn before_value(&mut self) -> io::Result<()> {
        match self.scopes.last_mut() {
            None => Ok(()),
            Some(scope) if scope.kind == ScopeKind::Array => {
                if scope.count > 0 {
                    self.out.write_all(b",")?;
                }
                scope.count += 1;
                Ok(())
            }
            Some(_) => {
                if !self.field_pending {
                    return Err(usage("value written in an object without a field name"));
                }
                self.field_pending = false;
                Ok(())
            }
        }
    }

    fn end_scope(&mut self, kind: ScopeKind) -> io::Result<()> {
        if self.field_pending {
            return Err(usage("scope closed while a field value was expected"));
        }
        match self.scopes.last() {
            Some(scope) if scope.kind == kind => {
                self.scopes.pop();
                Ok(())
            }
            _ => Err(usage("closed a scope that is not open")),
        }
    }

    fn write_escaped(&mut self, v: &str) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, v).map_err(io::Error::from)
    }
}

fn usage(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}

#[cfg(test)]
mod tests {
    use common_base::types::NumericValue;

    use crate::json::writer::JsonWriter;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut JsonWriter<Vec<u8>>) -> std::io::Result<()>,
    {
        let mut w = JsonWriter::new(Vec::new());
        f(&mut w).unwrap();
        String::from_utf8(w.into_inner()).unwrap()
    }

    #[test]
    fn test_separators() {
        let s = render(|w| {
            w.start_object()?;
            w.string_field("a", "x\"y")?;
            w.start_array_field("b")?;
            w.write_i64(1)?;
            w.write_f64(1.0)?;
            w.write_null()?;
            w.start_object()?;
            w.end_object()?;
            w.end_array()?;
            w.bool_field("c", false)?;
            w.end_object()
        });
        assert_eq!(s, r#"{"a":"x\"y","b":[1,1.0,null,{}],"c":false}"#);
    }

    #[test]
    fn test_numbers() {
        let s = render(|w| {
            w.start_array()?;
            w.write_f64(3.5)?;
            w.write_f64(f64::NAN)?;
            w.write_f64(f64::NEG_INFINITY)?;
            w.write_numeric(Some(NumericValue::Integer(-7)))?;
            w.write_numeric(Some(NumericValue::Float(0.25)))?;
            w.end_array()
        });
        assert_eq!(s, r#"[3.5,"NaN","-Infinity",-7,0.25]"#);
    }

    #[test]
    fn test_raw_values() {
        let s = render(|w| {
            w.start_array()?;
            w.write_raw_value(b"{\"x\":1}")?;
            w.write_raw_value(b"{\"y\":2}")?;
            w.end_array()
        });
        assert_eq!(s, r#"[{"x":1},{"y":2}]"#);
    }

    #[test]
    fn test_object_fragment() {
        let mut w = JsonWriter::object_fragment(Vec::new());
        w.numeric_field("0", Some(NumericValue::Integer(1))).unwrap();
        w.numeric_field("10", Some(NumericValue::Float(2.5))).unwrap();
        assert_eq!(
            String::from_utf8(w.into_inner()).unwrap(),
            r#""0":1,"10":2.5"#
        );
    }

    #[test]
    fn test_array_fragment() {
        let mut w = JsonWriter::array_fragment(Vec::new());
        w.start_object().unwrap();
        w.end_object().unwrap();
        w.write_string("x").unwrap();
        assert_eq!(String::from_utf8(w.into_inner()).unwrap(), r#"{},"x""#);
    }

    #[test]
    fn test_raw_fields() {
        let s = render(|w| {
            w.start_object()?;
            w.string_field("a", "x")?;
            w.write_raw_fields(br#""b":1,"c":2"#)?;
            w.write_raw_fields(b"")?;
            w.bool_field("d", true)?;
            w.end_object()
        });
        assert_eq!(s, r#"{"a":"x","b":1,"c":2,"d":true}"#);
    }

    #[test]
    fn test_misuse() {
        let mut w = JsonWriter::new(Vec::new());
        w.start_object().unwrap();
        assert!(w.write_i64(1).is_err());
        assert!(w.end_array().is_err());
        w.field_name("a").unwrap();
        assert!(w.end_object().is_err());
        assert!(w.field_name("b").is_err());
    }
}
