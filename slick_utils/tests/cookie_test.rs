#![cfg(target_arch = "wasm32")]
#![allow(missing_docs)]

use slick_utils::CookieJar;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn test_get_and_delete() {
    let jar = CookieJar::current().unwrap();
    let document: web_sys::HtmlDocument = wasm_bindgen::JsCast::dyn_into(
        web_sys::window().unwrap().document().unwrap(),
    )
    .unwrap();

    document.set_cookie("greeting=hello%20there; path=/").unwrap();
    assert_eq!(jar.get("greeting").as_deref(), Some("hello there"));

    jar.delete("greeting").unwrap();
    assert_eq!(jar.get("greeting"), None);
}
