use nu_plugin::{serve_plugin, MsgPackSerializer};
use nu_plugin_neardup::NearDupPlugin;

fn main() {
    serve_plugin(&NearDupPlugin, MsgPackSerializer {})
}
