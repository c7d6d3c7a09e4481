use super::{
    BlockAttribute, ContentItem, ExchangeDocument, ExchangeField, ExchangeNode, ExchangeText,
    FieldContent, content_hash,
};
use crate::error::ExchangeError;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

pub const ROOT_ELEMENT: &str = "data";
pub const FIELD_ELEMENT: &str = "string";
pub const NODE_ELEMENT: &str = "block";
pub const CHUNK_ELEMENT: &str = "contentChunk";
pub const ATTRIBUTE_ELEMENT: &str = "blockAttribute";

const CDATA_END: &str = "]]>";

pub(super) fn write_document(document: &ExchangeDocument) -> Result<String, ExchangeError> {
    let mut writer = Writer::new(Vec::new());
    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(&mut writer, Event::Start(BytesStart::new(ROOT_ELEMENT)))?;

    for field in &document.fields {
        let mut start = BytesStart::new(FIELD_ELEMENT);
        start.push_attribute(("name", field.name.as_str()));
        emit(&mut writer, Event::Start(start))?;
        match &field.content {
            FieldContent::Text(text) => write_cdata(&mut writer, text)?,
            FieldContent::Blocks(nodes) => {
                for node in nodes {
                    write_node(&mut writer, node)?;
                }
            }
        }
        emit(&mut writer, Event::End(BytesEnd::new(FIELD_ELEMENT)))?;
    }

    emit(&mut writer, Event::End(BytesEnd::new(ROOT_ELEMENT)))?;
    String::from_utf8(writer.into_inner()).map_err(|e| ExchangeError::Write(e.to_string()))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &ExchangeNode) -> Result<(), ExchangeError> {
    let mut start = BytesStart::new(NODE_ELEMENT);
    start.push_attribute(("blockName", node.block_name.as_str()));
    start.push_attribute(("originalAttributes", node.original_attributes.as_str()));
    emit(writer, Event::Start(start))?;

    for item in &node.content {
        match item {
            ContentItem::Chunk(chunk) => {
                let mut start = BytesStart::new(CHUNK_ELEMENT);
                start.push_attribute(("hash", chunk.hash.as_str()));
                emit(writer, Event::Start(start))?;
                write_cdata(writer, &chunk.text)?;
                emit(writer, Event::End(BytesEnd::new(CHUNK_ELEMENT)))?;
            }
            ContentItem::Node(child) => write_node(writer, child)?,
        }
    }

    for attribute in &node.block_attributes {
        let mut start = BytesStart::new(ATTRIBUTE_ELEMENT);
        start.push_attribute(("name", attribute.path.as_str()));
        start.push_attribute(("hash", attribute.hash.as_str()));
        emit(writer, Event::Start(start))?;
        write_cdata(writer, &attribute.text)?;
        emit(writer, Event::End(BytesEnd::new(ATTRIBUTE_ELEMENT)))?;
    }

    emit(writer, Event::End(BytesEnd::new(NODE_ELEMENT)))
}

/// Writes `text` as CDATA, splitting the section wherever the text contains `]]>`.
fn write_cdata(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<(), ExchangeError> {
    let mut rest = text;
    while let Some(index) = rest.find(CDATA_END) {
        // `]]` closes one section and `>` opens the next.
        let split = index + 2;
        emit(writer, Event::CData(BytesCData::new(&rest[..split])))?;
        rest = &rest[split..];
    }
    emit(writer, Event::CData(BytesCData::new(rest)))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), ExchangeError> {
    writer
        .write_event(event)
        .map_err(|e| ExchangeError::Write(e.to_string()))
}

pub(super) fn read_document(input: &str, max_depth: usize) -> Result<ExchangeDocument, ExchangeError> {
    let mut source = XmlSource {
        reader: Reader::from_str(input),
        max_depth,
    };

    loop {
        match source.next_event()? {
            Event::Start(start) => {
                expect_element(&start, ROOT_ELEMENT, "document")?;
                return source.read_fields();
            }
            Event::Empty(start) => {
                expect_element(&start, ROOT_ELEMENT, "document")?;
                return Ok(ExchangeDocument::new());
            }
            Event::Text(text) if is_blank(&text) => {}
            Event::Text(_) | Event::CData(_) => {
                return Err(ExchangeError::Xml("text outside of the root element".to_string()));
            }
            Event::Eof => return Err(ExchangeError::MissingRoot),
            _ => {}
        }
    }
}

struct XmlSource<'i> {
    reader: Reader<&'i [u8]>,
    max_depth: usize,
}

impl<'i> XmlSource<'i> {
    fn next_event(&mut self) -> Result<Event<'i>, ExchangeError> {
        self.reader
            .read_event()
            .map_err(|e| ExchangeError::Xml(format!("{} at byte {}", e, self.reader.buffer_position())))
    }

    fn read_fields(&mut self) -> Result<ExchangeDocument, ExchangeError> {
        let mut document = ExchangeDocument::new();
        loop {
            match self.next_event()? {
                Event::Start(start) => {
                    expect_element(&start, FIELD_ELEMENT, ROOT_ELEMENT)?;
                    let field = self.read_field(&start)?;
                    document.fields.push(field);
                }
                Event::Empty(start) => {
                    expect_element(&start, FIELD_ELEMENT, ROOT_ELEMENT)?;
                    document.fields.push(ExchangeField {
                        name: required_attribute(&start, FIELD_ELEMENT, "name")?,
                        content: FieldContent::Text(String::new()),
                    });
                }
                Event::Text(text) if is_blank(&text) => {}
                Event::Text(_) | Event::CData(_) => {
                    return Err(ExchangeError::Xml(format!("unexpected text inside '{}'", ROOT_ELEMENT)));
                }
                Event::End(_) => return Ok(document),
                Event::Eof => return Err(unexpected_eof(ROOT_ELEMENT)),
                _ => {}
            }
        }
    }

    fn read_field(&mut self, start: &BytesStart<'_>) -> Result<ExchangeField, ExchangeError> {
        let name = required_attribute(start, FIELD_ELEMENT, "name")?;
        let mut text = String::new();
        let mut nodes = Vec::new();

        loop {
            match self.next_event()? {
                Event::Text(chunk) => text.push_str(&unescape(&chunk)?),
                Event::CData(chunk) => text.push_str(cdata_str(&chunk)?),
                Event::Start(child) => {
                    expect_element(&child, NODE_ELEMENT, FIELD_ELEMENT)?;
                    nodes.push(self.read_node(&child, 1)?);
                }
                Event::Empty(child) => {
                    expect_element(&child, NODE_ELEMENT, FIELD_ELEMENT)?;
                    nodes.push(self.empty_node(&child, 1)?);
                }
                Event::End(_) => break,
                Event::Eof => return Err(unexpected_eof(FIELD_ELEMENT)),
                _ => {}
            }
        }

        let content = if nodes.is_empty() {
            FieldContent::Text(text)
        } else {
            FieldContent::Blocks(nodes)
        };
        Ok(ExchangeField { name, content })
    }

    fn empty_node(&self, start: &BytesStart<'_>, depth: usize) -> Result<ExchangeNode, ExchangeError> {
        if depth > self.max_depth {
            return Err(ExchangeError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        Ok(ExchangeNode {
            block_name: optional_attribute(start, "blockName")?.unwrap_or_default(),
            original_attributes: optional_attribute(start, "originalAttributes")?.unwrap_or_default(),
            content: Vec::new(),
            block_attributes: Vec::new(),
        })
    }

    fn read_node(&mut self, start: &BytesStart<'_>, depth: usize) -> Result<ExchangeNode, ExchangeError> {
        let mut node = self.empty_node(start, depth)?;

        loop {
            match self.next_event()? {
                Event::Start(child) => match element_name(&child).as_str() {
                    CHUNK_ELEMENT => {
                        let hash = optional_attribute(&child, "hash")?;
                        let text = self.read_text(CHUNK_ELEMENT)?;
                        node.content.push(ContentItem::Chunk(chunk_with_hash(text, hash)));
                    }
                    ATTRIBUTE_ELEMENT => {
                        let path = required_attribute(&child, ATTRIBUTE_ELEMENT, "name")?;
                        let hash = optional_attribute(&child, "hash")?;
                        let text = self.read_text(ATTRIBUTE_ELEMENT)?;
                        node.block_attributes.push(attribute_with_hash(path, text, hash));
                    }
                    NODE_ELEMENT => {
                        let nested = self.read_node(&child, depth + 1)?;
                        node.content.push(ContentItem::Node(nested));
                    }
                    other => return Err(unexpected_element(NODE_ELEMENT, other)),
                },
                Event::Empty(child) => match element_name(&child).as_str() {
                    CHUNK_ELEMENT => {
                        let hash = optional_attribute(&child, "hash")?;
                        node.content.push(ContentItem::Chunk(chunk_with_hash(String::new(), hash)));
                    }
                    ATTRIBUTE_ELEMENT => {
                        let path = required_attribute(&child, ATTRIBUTE_ELEMENT, "name")?;
                        let hash = optional_attribute(&child, "hash")?;
                        node.block_attributes
                            .push(attribute_with_hash(path, String::new(), hash));
                    }
                    NODE_ELEMENT => {
                        let nested = self.empty_node(&child, depth + 1)?;
                        node.content.push(ContentItem::Node(nested));
                    }
                    other => return Err(unexpected_element(NODE_ELEMENT, other)),
                },
                Event::Text(text) if is_blank(&text) => {}
                Event::Text(_) | Event::CData(_) => {
                    return Err(ExchangeError::Xml(format!("unexpected text inside '{}'", NODE_ELEMENT)));
                }
                Event::End(_) => return Ok(node),
                Event::Eof => return Err(unexpected_eof(NODE_ELEMENT)),
                _ => {}
            }
        }
    }

    fn read_text(&mut self, element: &str) -> Result<String, ExchangeError> {
        let mut text = String::new();
        loop {
            match self.next_event()? {
                Event::Text(chunk) => text.push_str(&unescape(&chunk)?),
                Event::CData(chunk) => text.push_str(cdata_str(&chunk)?),
                Event::Start(child) | Event::Empty(child) => {
                    return Err(unexpected_element(element, &element_name(&child)));
                }
                Event::End(_) => return Ok(text),
                Event::Eof => return Err(unexpected_eof(element)),
                _ => {}
            }
        }
    }
}

fn chunk_with_hash(text: String, hash: Option<String>) -> ExchangeText {
    let hash = hash.unwrap_or_else(|| content_hash(&text));
    ExchangeText { text, hash }
}

fn attribute_with_hash(path: String, text: String, hash: Option<String>) -> BlockAttribute {
    let hash = hash.unwrap_or_else(|| content_hash(&text));
    BlockAttribute { path, text, hash }
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn expect_element(start: &BytesStart<'_>, expected: &str, parent: &str) -> Result<(), ExchangeError> {
    let found = element_name(start);
    if found == expected {
        Ok(())
    } else {
        Err(unexpected_element(parent, &found))
    }
}

fn optional_attribute(start: &BytesStart<'_>, key: &str) -> Result<Option<String>, ExchangeError> {
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| ExchangeError::Xml(e.to_string()))?;
        if attribute.key.as_ref() == key.as_bytes() {
            let value = attribute
                .unescape_value()
                .map_err(|e| ExchangeError::Xml(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn required_attribute(start: &BytesStart<'_>, element: &str, key: &str) -> Result<String, ExchangeError> {
    optional_attribute(start, key)?.ok_or_else(|| ExchangeError::MissingAttribute {
        element: element.to_string(),
        attribute: key.to_string(),
    })
}

fn unescape(text: &BytesText<'_>) -> Result<String, ExchangeError> {
    text.unescape()
        .map(|cow| cow.into_owned())
        .map_err(|e| ExchangeError::Xml(e.to_string()))
}

fn cdata_str<'a>(cdata: &'a BytesCData<'_>) -> Result<&'a str, ExchangeError> {
    std::str::from_utf8(cdata).map_err(|e| ExchangeError::Xml(e.to_string()))
}

fn is_blank(text: &BytesText<'_>) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

fn unexpected_element(parent: &str, found: &str) -> ExchangeError {
    ExchangeError::UnexpectedElement {
        parent: parent.to_string(),
        found: found.to_string(),
    }
}

fn unexpected_eof(element: &str) -> ExchangeError {
    ExchangeError::Xml(format!("document ends inside '{}'", element))
}
