//! OOXML package writer (and a tiny reader) for [`Document`].
//!
//! The package holds one master, one blank layout, one theme and one part
//! per slide. Pictures are stored under `ppt/media/` and referenced from the
//! slide relationships starting at `rId2` (`rId1` is always the layout).

use anyhow::{Context, Result};
use std::borrow::Cow;
use quick_xml::escape::{escape, unescape};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::services::document::{
    Align, DeckSummary, Document, Paragraph, Picture, Rgb, Shape, Slide, TextBox, Theme,
    MIME_TYPE,
};

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CT: &str = "application/vnd.openxmlformats-officedocument";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// First slide id allowed by the schema.
const FIRST_SLIDE_ID: usize = 256;

pub(crate) fn write_package<W: Write + Seek>(doc: &Document, writer: W) -> Result<()> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    put(&mut zip, options, "[Content_Types].xml", &content_types(doc)?)?;
    put(&mut zip, options, "_rels/.rels", &root_rels())?;
    put(&mut zip, options, "ppt/presentation.xml", &presentation(doc)?)?;
    put(
        &mut zip,
        options,
        "ppt/_rels/presentation.xml.rels",
        &presentation_rels(doc)?,
    )?;
    put(&mut zip, options, "ppt/theme/theme1.xml", &theme(&doc.theme)?)?;
    put(
        &mut zip,
        options,
        "ppt/slideMasters/slideMaster1.xml",
        &slide_master(&doc.theme)?,
    )?;
    put(
        &mut zip,
        options,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        &relationships(&[
            ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
            ("rId2", "theme", "../theme/theme1.xml"),
        ])?,
    )?;
    put(
        &mut zip,
        options,
        "ppt/slideLayouts/slideLayout1.xml",
        &slide_layout(),
    )?;
    put(
        &mut zip,
        options,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        &relationships(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")])?,
    )?;

    let mut media_count = 0;
    for (index, slide) in doc.slides.iter().enumerate() {
        let number = index + 1;
        let mut rels = vec![(
            "rId1".to_string(),
            "slideLayout",
            "../slideLayouts/slideLayout1.xml".to_string(),
        )];

        for picture in pictures(slide) {
            media_count += 1;
            let media = format!("image{}.{}", media_count, picture.format.extension());
            put(
                &mut zip,
                options,
                &format!("ppt/media/{}", media),
                &picture.data,
            )?;
            rels.push((
                format!("rId{}", rels.len() + 1),
                "image",
                format!("../media/{}", media),
            ));
        }

        put(
            &mut zip,
            options,
            &format!("ppt/slides/slide{}.xml", number),
            &slide_xml(slide, &doc.theme)?,
        )?;
        let rels: Vec<(&str, &str, &str)> = rels
            .iter()
            .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str()))
            .collect();
        put(
            &mut zip,
            options,
            &format!("ppt/slides/_rels/slide{}.xml.rels", number),
            &relationships(&rels)?,
        )?;
    }

    let mut writer = zip.finish()?;
    writer.flush()?;
    Ok(())
}

fn put<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    options: SimpleFileOptions,
    name: &str,
    data: impl AsRef<[u8]>,
) -> Result<()> {
    zip.start_file(name, options)
        .with_context(|| format!("Failed to start part {}", name))?;
    zip.write_all(data.as_ref())?;
    Ok(())
}

fn pictures(slide: &Slide) -> impl Iterator<Item = &Picture> {
    slide.shapes.iter().filter_map(|shape| match shape {
        Shape::Picture(p) => Some(p),
        Shape::Text(_) => None,
    })
}

fn content_types(doc: &Document) -> Result<String> {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Default Extension="png" ContentType="image/png"/>"#);
    xml.push_str(r#"<Default Extension="jpeg" ContentType="image/jpeg"/>"#);
    write!(
        xml,
        r#"<Override PartName="/ppt/presentation.xml" ContentType="{MIME_TYPE}.main+xml"/>"#
    )?;
    write!(
        xml,
        r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="{CT}.presentationml.slideMaster+xml"/>"#
    )?;
    write!(
        xml,
        r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="{CT}.presentationml.slideLayout+xml"/>"#
    )?;
    write!(
        xml,
        r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="{CT}.theme+xml"/>"#
    )?;
    for number in 1..=doc.slides.len() {
        write!(
            xml,
            r#"<Override PartName="/ppt/slides/slide{number}.xml" ContentType="{CT}.presentationml.slide+xml"/>"#
        )?;
    }
    xml.push_str("</Types>");
    Ok(xml)
}

fn root_rels() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="{NS_RELS}"><Relationship Id="rId1" Type="{REL}/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#
    )
}

fn relationships(rels: &[(&str, &str, &str)]) -> Result<String> {
    let mut xml = String::with_capacity(512);
    write!(xml, r#"{XML_DECL}<Relationships xmlns="{NS_RELS}">"#)?;
    for (id, kind, target) in rels {
        write!(
            xml,
            r#"<Relationship Id="{id}" Type="{REL}/{kind}" Target="{target}"/>"#
        )?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

// presentation.xml.rels: rId1 master, rId2 theme, slides from rId3
fn presentation_rels(doc: &Document) -> Result<String> {
    let slide_targets: Vec<(String, String)> = (1..=doc.slides.len())
        .map(|n| (format!("rId{}", n + 2), format!("slides/slide{}.xml", n)))
        .collect();
    let mut rels = vec![
        ("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
        ("rId2", "theme", "theme/theme1.xml"),
    ];
    rels.extend(
        slide_targets
            .iter()
            .map(|(id, target)| (id.as_str(), "slide", target.as_str())),
    );
    relationships(&rels)
}

fn presentation(doc: &Document) -> Result<String> {
    let mut xml = String::with_capacity(1024);
    write!(
        xml,
        r#"{XML_DECL}<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}">"#
    )?;
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
    if !doc.slides.is_empty() {
        xml.push_str("<p:sldIdLst>");
        for index in 0..doc.slides.len() {
            write!(
                xml,
                r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                FIRST_SLIDE_ID + index,
                index + 3
            )?;
        }
        xml.push_str("</p:sldIdLst>");
    }
    write!(
        xml,
        r#"<p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/>"#,
        doc.width, doc.height
    )?;
    xml.push_str("</p:presentation>");
    Ok(xml)
}

/// Characters XML 1.0 cannot carry at all, not even as references.
fn is_xml_forbidden(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}')
}

/// Escapes markup and encodes forbidden control characters as `_xHHHH_`.
fn xml_text(text: &str) -> Cow<'_, str> {
    if !text.contains(is_xml_forbidden) {
        return escape(text);
    }
    let encoded: String = text
        .chars()
        .map(|c| {
            if is_xml_forbidden(c) {
                format!("_x{:04X}_", c as u32)
            } else {
                c.to_string()
            }
        })
        .collect();
    Cow::Owned(escape(encoded.as_str()).into_owned())
}

fn background(xml: &mut String, color: Option<Rgb>) -> Result<()> {
    if let Some(color) = color {
        write!(
            xml,
            r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
            color.hex()
        )?;
    }
    Ok(())
}

fn group_header(xml: &mut String) {
    xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
    xml.push_str(r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#);
}

fn slide_master(theme: &Theme) -> Result<String> {
    let mut xml = String::with_capacity(1024);
    write!(
        xml,
        r#"{XML_DECL}<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld>"#
    )?;
    background(&mut xml, theme.background)?;
    xml.push_str("<p:spTree>");
    group_header(&mut xml);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#);
    xml.push_str(r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#);
    xml.push_str("</p:sldMaster>");
    Ok(xml)
}

fn slide_layout() -> String {
    let mut xml = format!(
        r#"{XML_DECL}<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" type="blank" preserve="1"><p:cSld name="Blank"><p:spTree>"#
    );
    group_header(&mut xml);
    xml.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>");
    xml
}

fn theme(theme: &Theme) -> Result<String> {
    let light = theme.background.unwrap_or(Rgb(255, 255, 255));
    let font = xml_text(&theme.font);
    let mut xml = String::with_capacity(4096);
    write!(
        xml,
        r#"{XML_DECL}<a:theme xmlns:a="{NS_A}" name="Pitch Deck"><a:themeElements><a:clrScheme name="Pitch Deck">"#
    )?;
    xml.push_str(r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#);
    xml.push_str(r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#);
    let scheme = [
        ("dk2", theme.body_text),
        ("lt2", light),
        ("accent1", theme.accent),
        ("accent2", Rgb(0x29, 0x62, 0xFF)),
        ("accent3", Rgb(0x00, 0xC8, 0x53)),
        ("accent4", Rgb(0x54, 0x6E, 0x7A)),
        ("accent5", theme.muted),
        ("accent6", Rgb(0xB0, 0xBE, 0xC5)),
        ("hlink", Rgb(0x29, 0x62, 0xFF)),
        ("folHlink", Rgb(0x54, 0x6E, 0x7A)),
    ];
    for (name, color) in scheme {
        write!(xml, r#"<a:{name}><a:srgbClr val="{}"/></a:{name}>"#, color.hex())?;
    }
    xml.push_str("</a:clrScheme>");

    write!(xml, r#"<a:fontScheme name="Pitch Deck">"#)?;
    for slot in ["majorFont", "minorFont"] {
        write!(
            xml,
            r#"<a:{slot}><a:latin typeface="{font}"/><a:ea typeface=""/><a:cs typeface=""/></a:{slot}>"#
        )?;
    }
    xml.push_str("</a:fontScheme>");

    let fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    xml.push_str(r#"<a:fmtScheme name="Pitch Deck"><a:fillStyleLst>"#);
    xml.push_str(&fill.repeat(3));
    xml.push_str("</a:fillStyleLst><a:lnStyleLst>");
    for width in [6350, 12700, 19050] {
        write!(xml, r#"<a:ln w="{width}">{fill}</a:ln>"#)?;
    }
    xml.push_str("</a:lnStyleLst><a:effectStyleLst>");
    xml.push_str(&"<a:effectStyle><a:effectLst/></a:effectStyle>".repeat(3));
    xml.push_str("</a:effectStyleLst><a:bgFillStyleLst>");
    xml.push_str(&fill.repeat(3));
    xml.push_str("</a:bgFillStyleLst></a:fmtScheme>");

    xml.push_str("</a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>");
    Ok(xml)
}

fn slide_xml(slide: &Slide, theme: &Theme) -> Result<String> {
    let mut xml = String::with_capacity(4096);
    write!(
        xml,
        r#"{XML_DECL}<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld>"#
    )?;
    background(&mut xml, theme.background)?;
    xml.push_str("<p:spTree>");
    group_header(&mut xml);

    // shape ids start after the group (id 1); picture rels after the layout (rId1)
    let mut picture_rel = 1;
    for (index, shape) in slide.shapes.iter().enumerate() {
        let id = index + 2;
        match shape {
            Shape::Text(text) => text_box(&mut xml, id, text, &theme.font)?,
            Shape::Picture(picture) => {
                picture_rel += 1;
                picture_xml(&mut xml, id, picture, picture_rel)?;
            }
        }
    }

    xml.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
    Ok(xml)
}

fn text_box(xml: &mut String, id: usize, text: &TextBox, font: &str) -> Result<()> {
    write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
        id - 1
    )?;
    write!(
        xml,
        r#"<p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#,
        text.frame.x, text.frame.y, text.frame.cx, text.frame.cy
    )?;
    write!(
        xml,
        r#"<p:txBody><a:bodyPr wrap="{}" rtlCol="0"><a:spAutoFit/></a:bodyPr><a:lstStyle/>"#,
        if text.wrap { "square" } else { "none" }
    )?;
    for paragraph in &text.paragraphs {
        paragraph_xml(xml, paragraph, font)?;
    }
    if text.paragraphs.is_empty() {
        // a text body needs at least one paragraph
        xml.push_str("<a:p/>");
    }
    xml.push_str("</p:txBody></p:sp>");
    Ok(())
}

fn paragraph_xml(xml: &mut String, paragraph: &Paragraph, font: &str) -> Result<()> {
    let align = match paragraph.align {
        Align::Left => "l",
        Align::Center => "ctr",
    };
    let size = paragraph.size_pt * 100;
    let color = paragraph.color.hex();
    let font = xml_text(font);

    write!(xml, r#"<a:p><a:pPr algn="{align}">"#)?;
    if let Some(after) = paragraph.space_after_pt {
        write!(xml, r#"<a:spcAft><a:spcPts val="{}"/></a:spcAft>"#, after * 100)?;
    }
    xml.push_str("</a:pPr>");

    for run in &paragraph.runs {
        write!(
            xml,
            r#"<a:r><a:rPr lang="en-US" sz="{size}" b="{}" i="{}" dirty="0"><a:solidFill><a:srgbClr val="{color}"/></a:solidFill><a:latin typeface="{font}"/></a:rPr><a:t>{}</a:t></a:r>"#,
            u8::from(run.bold),
            u8::from(run.italic),
            xml_text(&run.text)
        )?;
    }

    write!(xml, r#"<a:endParaRPr lang="en-US" sz="{size}" dirty="0"/></a:p>"#)?;
    Ok(())
}

fn picture_xml(xml: &mut String, id: usize, picture: &Picture, rel: usize) -> Result<()> {
    write!(
        xml,
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {}" descr="{}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
        id - 1,
        xml_text(&picture.description)
    )?;
    write!(
        xml,
        r#"<p:blipFill><a:blip r:embed="rId{rel}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#
    )?;
    write!(
        xml,
        r#"<p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
        picture.frame.x, picture.frame.y, picture.frame.cx, picture.frame.cy
    )?;
    Ok(())
}

fn read_part(archive: &mut ZipArchive<File>, name: &str) -> Result<String> {
    let mut part = archive
        .by_name(name)
        .with_context(|| format!("Presentation is missing {}", name))?;
    let mut content = String::new();
    part.read_to_string(&mut content)?;
    Ok(content)
}

fn first_text(slide_xml: &str) -> Result<Option<String>> {
    let Some(start) = slide_xml.find("<a:t>") else {
        return Ok(None);
    };
    let rest = &slide_xml[start + "<a:t>".len()..];
    let end = rest.find("</a:t>").context("Unterminated text run")?;
    Ok(Some(unescape(&rest[..end])?.into_owned()))
}

pub(crate) fn read_summary(path: &Path) -> Result<DeckSummary> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut archive = ZipArchive::new(file).context("Not a presentation package")?;

    let presentation = read_part(&mut archive, "ppt/presentation.xml")?;
    let slide_count = presentation.matches("<p:sldId ").count();
    let title = if slide_count > 0 {
        first_text(&read_part(&mut archive, "ppt/slides/slide1.xml")?)?
    } else {
        None
    };

    Ok(DeckSummary { slide_count, title })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::slide::{SlideKind, SlideSpec};
    use crate::services::document::{Frame, MediaFormat};
    use std::io::Cursor;

    fn package(doc: &Document) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut buf = Cursor::new(Vec::new());
        write_package(doc, &mut buf).unwrap();
        ZipArchive::new(Cursor::new(buf.into_inner())).unwrap()
    }

    fn part(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut content = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    #[test]
    fn test_empty_document_package() {
        let mut archive = package(&Document::new(true));
        let presentation = part(&mut archive, "ppt/presentation.xml");
        assert!(!presentation.contains("<p:sldIdLst>"));
        assert!(presentation.contains(r#"<p:sldSz cx="14630400" cy="8229600"/>"#));

        // the master carries the background so later slides inherit it
        let master = part(&mut archive, "ppt/slideMasters/slideMaster1.xml");
        assert!(master.contains(r#"<a:srgbClr val="F5F5F5"/>"#));
    }

    #[test]
    fn test_slides_and_media_are_linked() {
        let mut doc = Document::new(true);
        doc.add_title_slide("Acme", "Robots");
        doc.slides.push(Slide {
            shapes: vec![Shape::Picture(Picture {
                frame: Frame::inches(9.0, 1.5, 6.0, 4.5),
                description: "Market \"Size\"".to_string(),
                data: vec![0x89, b'P', b'N', b'G'],
                format: MediaFormat::Png,
            })],
        });

        let mut archive = package(&doc);
        let types = part(&mut archive, "[Content_Types].xml");
        assert!(types.contains("/ppt/slides/slide2.xml"));

        let rels = part(&mut archive, "ppt/slides/_rels/slide2.xml.rels");
        assert!(rels.contains(r#"Id="rId2""#));
        assert!(rels.contains("../media/image1.png"));

        let slide = part(&mut archive, "ppt/slides/slide2.xml");
        assert!(slide.contains(r#"r:embed="rId2""#));
        assert!(slide.contains("Market &quot;Size&quot;"));
        assert!(slide.contains(r#"<a:srgbClr val="F5F5F5"/>"#));

        let mut media = Vec::new();
        archive
            .by_name("ppt/media/image1.png")
            .unwrap()
            .read_to_end(&mut media)
            .unwrap();
        assert_eq!(media, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_plain_theme_has_no_background() {
        let mut doc = Document::new(false);
        doc.add_title_slide("Acme", "Robots");
        let mut archive = package(&doc);
        let slide = part(&mut archive, "ppt/slides/slide1.xml");
        assert!(!slide.contains("<p:bg>"));
    }

    #[test]
    fn test_presentation_part_uses_deck_mime_type() {
        let mut archive = package(&Document::new(true));
        let types = part(&mut archive, "[Content_Types].xml");
        assert!(types.contains(&format!(
            r#"PartName="/ppt/presentation.xml" ContentType="{}.main+xml""#,
            MIME_TYPE
        )));
    }

    #[test]
    fn test_every_text_body_has_a_paragraph() {
        let mut doc = Document::new(true);
        doc.add_title_slide("Acme", "");
        doc.slides.push(Slide {
            shapes: vec![Shape::Text(TextBox {
                frame: Frame::inches(0.5, 0.5, 4.0, 1.0),
                wrap: true,
                paragraphs: vec![],
            })],
        });

        let mut archive = package(&doc);
        for name in ["ppt/slides/slide1.xml", "ppt/slides/slide2.xml"] {
            let slide = part(&mut archive, name);
            assert!(!slide.contains("<a:lstStyle/></p:txBody>"), "{}", name);
        }
        let slide = part(&mut archive, "ppt/slides/slide2.xml");
        assert!(slide.contains("<a:lstStyle/><a:p/></p:txBody>"));
    }

    #[test]
    fn test_control_characters_are_encoded() {
        assert_eq!(xml_text("a\u{1}<b\u{1F}\tc"), "a_x0001_&lt;b_x001F_\tc");
        assert!(matches!(xml_text("plain"), Cow::Borrowed(_)));

        let mut doc = Document::new(true);
        doc.add_content_slide(&SlideSpec::new(SlideKind::Problem, "The Problem", "Pain\u{1}point"));
        let mut archive = package(&doc);
        let slide = part(&mut archive, "ppt/slides/slide1.xml");
        assert!(slide.contains("Pain_x0001_point"));
        assert!(!slide.contains(is_xml_forbidden));
    }

    #[test]
    fn test_first_text_unescapes() {
        let xml = "<p:sp><a:t>R&amp;D &lt;Labs&gt;</a:t></p:sp>";
        assert_eq!(first_text(xml).unwrap().as_deref(), Some("R&D <Labs>"));
        assert_eq!(first_text("<p:sp/>").unwrap(), None);
    }
}
