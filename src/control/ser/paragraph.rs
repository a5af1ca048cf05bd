// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

use super::Error;
use serde::{ser, Serialize};

/// Serializer for deb822 style Control blocks. Only usable at the struct
/// level -- a Control file is a sequence of `Key: value` fields, so there's
/// no sensible encoding for a bare scalar, sequence or map at the top.
#[derive(Default)]
pub(super) struct Serializer {
    output: String,
}

impl Serializer {
    pub(super) fn output(self) -> String {
        self.output
    }
}

macro_rules! top_level_bad_type {
    ($name:ident, $ty:ty) => {
        fn $name(self, _v: $ty) -> Result<Self::Ok, Self::Error> {
            Err(Error::BadType)
        }
    };
}

impl<'a> ser::Serializer for &'a mut Serializer {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = ser::Impossible<(), Error>;
    type SerializeTuple = ser::Impossible<(), Error>;
    type SerializeTupleStruct = ser::Impossible<(), Error>;
    type SerializeTupleVariant = ser::Impossible<(), Error>;
    type SerializeMap = ser::Impossible<(), Error>;
    type SerializeStruct = StructSerializer<'a>;
    type SerializeStructVariant = ser::Impossible<(), Error>;

    top_level_bad_type!(serialize_bool, bool);
    top_level_bad_type!(serialize_i8, i8);
    top_level_bad_type!(serialize_i16, i16);
    top_level_bad_type!(serialize_i32, i32);
    top_level_bad_type!(serialize_i64, i64);
    top_level_bad_type!(serialize_u8, u8);
    top_level_bad_type!(serialize_u16, u16);
    top_level_bad_type!(serialize_u32, u32);
    top_level_bad_type!(serialize_u64, u64);
    top_level_bad_type!(serialize_f32, f32);
    top_level_bad_type!(serialize_f64, f64);
    top_level_bad_type!(serialize_char, char);
    top_level_bad_type!(serialize_str, &str);
    top_level_bad_type!(serialize_bytes, &[u8]);

    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_some<T>(self, _value: &T) -> Result<Self::Ok, Self::Error>
    where
        T: Serialize + ?Sized,
    {
        Err(Error::BadType)
    }

    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Self::Ok, Self::Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: Serialize + ?Sized,
    {
        Err(Error::BadType)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct, Self::Error> {
        Ok(StructSerializer { ser: self })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Err(Error::BadType)
    }
}

/// What a single field's value turns into once serialized.
enum Field {
    /// `Option::None`: the field is omitted entirely.
    Skip,
    /// A value that fits on the `Key: value` line itself.
    Scalar(String),
    /// A value folded onto its own continuation lines, each indented by a
    /// single space; an empty line is written as a lone `.`, the deb822
    /// convention for a literal blank line inside a multiline field.
    Lines(Vec<String>),
}

fn split_multiline(value: &str) -> Vec<String> {
    let mut lines: Vec<&str> = value.split('\n').collect();
    if lines.first() == Some(&"") {
        lines.remove(0);
    }
    lines.into_iter().map(str::to_owned).collect()
}

pub(super) struct StructSerializer<'a> {
    ser: &'a mut Serializer,
}

impl ser::SerializeStruct for StructSerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize + ?Sized,
    {
        let field = value.serialize(FieldValueSerializer)?;
        match field {
            Field::Skip => {}
            Field::Scalar(value) => {
                self.ser.output.push_str(key);
                self.ser.output.push_str(": ");
                self.ser.output.push_str(&value);
                self.ser.output.push('\n');
            }
            Field::Lines(lines) => {
                self.ser.output.push_str(key);
                self.ser.output.push_str(":\n");
                for line in lines {
                    if line.is_empty() {
                        self.ser.output.push_str(" .\n");
                    } else {
                        self.ser.output.push(' ');
                        self.ser.output.push_str(&line);
                        self.ser.output.push('\n');
                    }
                }
            }
        }
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }
}

/// Serializes one field's value to a [Field]. A bare scalar becomes
/// [Field::Scalar]; a string containing embedded newlines or a sequence
/// becomes [Field::Lines]; `None` becomes [Field::Skip].
struct FieldValueSerializer;

macro_rules! field_scalar {
    ($name:ident, $ty:ty) => {
        fn $name(self, v: $ty) -> Result<Self::Ok, Self::Error> {
            Ok(Field::Scalar(v.to_string()))
        }
    };
}

impl ser::Serializer for FieldValueSerializer {
    type Ok = Field;
    type Error = Error;

    type SerializeSeq = SeqCollector;
    type SerializeTuple = ser::Impossible<Field, Error>;
    type SerializeTupleStruct = ser::Impossible<Field, Error>;
    type SerializeTupleVariant = ser::Impossible<Field, Error>;
    type SerializeMap = ser::Impossible<Field, Error>;
    type SerializeStruct = ser::Impossible<Field, Error>;
    type SerializeStructVariant = ser::Impossible<Field, Error>;

    fn serialize_bool(self, v: bool) -> Result<Self::Ok, Self::Error> {
        Ok(Field::Scalar(if v { "true".to_owned() } else { "false".to_owned() }))
    }

    field_scalar!(serialize_i8, i8);
    field_scalar!(serialize_i16, i16);
    field_scalar!(serialize_i32, i32);
    field_scalar!(serialize_i64, i64);
    field_scalar!(serialize_i128, i128);
    field_scalar!(serialize_u8, u8);
    field_scalar!(serialize_u16, u16);
    field_scalar!(serialize_u32, u32);
    field_scalar!(serialize_u64, u64);
    field_scalar!(serialize_u128, u128);
    field_scalar!(serialize_f32, f32);
    field_scalar!(serialize_f64, f64);
    field_scalar!(serialize_char, char);

    fn serialize_str(self, v: &str) -> Result<Self::Ok, Self::Error> {
        if v.contains('\n') {
            Ok(Field::Lines(split_multiline(v)))
        } else {
            Ok(Field::Scalar(v.to_owned()))
        }
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Self::Ok, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        Ok(Field::Skip)
    }

    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Self::Ok, Self::Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: Serialize + ?Sized,
    {
        Err(Error::BadType)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Ok(SeqCollector { values: Vec::with_capacity(len.unwrap_or(0)) })
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Err(Error::BadType)
    }
}

/// Collects a sequence's elements, each serialized to its own canonical
/// string via [ElementSerializer], into one continuation line per element.
struct SeqCollector {
    values: Vec<String>,
}

impl ser::SerializeSeq for SeqCollector {
    type Ok = Field;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize + ?Sized,
    {
        self.values.push(value.serialize(ElementSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok, Self::Error> {
        Ok(Field::Lines(self.values))
    }
}

/// Renders one sequence element to its canonical string form. A nested
/// sequence-of-sequences or a struct element has no sensible single-line
/// rendering here, so both are rejected with [Error::BadType].
struct ElementSerializer;

macro_rules! element_scalar {
    ($name:ident, $ty:ty) => {
        fn $name(self, v: $ty) -> Result<Self::Ok, Self::Error> {
            Ok(v.to_string())
        }
    };
}

impl ser::Serializer for ElementSerializer {
    type Ok = String;
    type Error = Error;

    type SerializeSeq = ser::Impossible<String, Error>;
    type SerializeTuple = ser::Impossible<String, Error>;
    type SerializeTupleStruct = ser::Impossible<String, Error>;
    type SerializeTupleVariant = ser::Impossible<String, Error>;
    type SerializeMap = ser::Impossible<String, Error>;
    type SerializeStruct = ser::Impossible<String, Error>;
    type SerializeStructVariant = ser::Impossible<String, Error>;

    fn serialize_bool(self, v: bool) -> Result<Self::Ok, Self::Error> {
        Ok(if v { "true".to_owned() } else { "false".to_owned() })
    }

    element_scalar!(serialize_i8, i8);
    element_scalar!(serialize_i16, i16);
    element_scalar!(serialize_i32, i32);
    element_scalar!(serialize_i64, i64);
    element_scalar!(serialize_i128, i128);
    element_scalar!(serialize_u8, u8);
    element_scalar!(serialize_u16, u16);
    element_scalar!(serialize_u32, u32);
    element_scalar!(serialize_u64, u64);
    element_scalar!(serialize_u128, u128);
    element_scalar!(serialize_f32, f32);
    element_scalar!(serialize_f64, f64);
    element_scalar!(serialize_char, char);

    fn serialize_str(self, v: &str) -> Result<Self::Ok, Self::Error> {
        Ok(v.to_owned())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Self::Ok, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_none(self) -> Result<Self::Ok, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Self::Ok, Self::Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok, Self::Error> {
        Ok(variant.to_owned())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Self::Ok, Self::Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok, Self::Error>
    where
        T: Serialize + ?Sized,
    {
        Err(Error::BadType)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct, Self::Error> {
        Err(Error::BadType)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Self::Error> {
        Err(Error::BadType)
    }
}

// vim: foldmethod=marker
