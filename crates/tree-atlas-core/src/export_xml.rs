use crate::model::AtlasDescription;

/// Build the XML description: a `description` summary element followed by one
/// `frame` element per placed image, in tree traversal order.
///
/// ```text
/// <?xml version="1.0" encoding="UTF-8"?>
/// <frames>
///   <description cntFrames="2" x_res="256" y_res="256"/>
///   <frame name="a" x="5" y="5" w="32" h="16"/>
///   ...
/// </frames>
/// ```
pub fn to_xml(desc: &AtlasDescription) -> String {
    let mut s = String::new();
    s.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<frames>\n");
    s.push_str(&format!(
        "  <description cntFrames=\"{}\" x_res=\"{}\" y_res=\"{}\"/>\n",
        desc.summary.count, desc.summary.width, desc.summary.height
    ));
    for fr in &desc.frames {
        s.push_str(&format!(
            "  <frame name=\"{}\" x=\"{}\" y=\"{}\" w=\"{}\" h=\"{}\"/>\n",
            xml_escape(&fr.name),
            fr.frame.x,
            fr.frame.y,
            fr.frame.w,
            fr.frame.h
        ));
    }
    s.push_str("</frames>\n");
    s
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
