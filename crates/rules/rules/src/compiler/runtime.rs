//! The fixed page-side interpreter embedded in every compiled artifact.
//!
//! The interpreter mirrors `engine::condition` and `engine::matcher` plus the
//! schedule gate of `RuleEngine::evaluate_at`. It only ever reads rule data
//! from the `rules` constant that precedes it; nothing in it depends on the
//! rule set, so it is identical across publishes.

/// Path of the targeting descriptor on the page's global object.
pub const DESCRIPTOR_PATH: &str = "window.page_meta.third_party_apps.ntAds.targeting";

/// Interpreter body. Expects a `rules` array in scope.
pub const RUNTIME: &str = r#"  var KEYS = {
    site: 1, keywords: 1, section: 1, top_section: 1, page_type: 1,
    content_id: 1, description_url: 1, domain: 1, ab_test: 1, ads_enabled: 1
  };
  var applied = {};

  function descriptor() {
    var w = window;
    return w.page_meta && w.page_meta.third_party_apps &&
      w.page_meta.third_party_apps.ntAds && w.page_meta.third_party_apps.ntAds.targeting;
  }

  function str(v) {
    if (v === null || v === undefined) return "";
    return typeof v === "object" ? JSON.stringify(v) : String(v);
  }

  function norm(v, cs) {
    var s = str(v);
    return cs ? s.trim() : s.toLowerCase().trim();
  }

  function adsEnabled(t) {
    return t.ads_enabled === true;
  }

  function actual(t, key) {
    if (key === "ads_enabled") return [adsEnabled(t) ? "true" : "false"];
    var raw = t[key];
    if (key === "keywords") {
      if (Array.isArray(raw)) return raw.map(str);
      if (typeof raw === "string") {
        return raw.split(",").map(function (s) { return s.trim(); })
          .filter(function (s) { return s.length > 0; });
      }
      return raw === null || raw === undefined ? [] : [str(raw)];
    }
    return [str(raw)];
  }

  function hits(tokens, values, exact) {
    return tokens.filter(function (tok) {
      return values.some(function (v) { return exact ? v === tok : v.indexOf(tok) !== -1; });
    });
  }

  function evalCond(c, t) {
    if (!KEYS.hasOwnProperty(c.targetKey)) return false;
    var cs = !!c.caseSensitive;
    var values = actual(t, c.targetKey).map(function (v) { return norm(v, cs); });
    var tokens = str(c.value).split(",").map(function (v) { return norm(v, cs); })
      .filter(function (v) { return v.length > 0; });
    var list = c.targetKey === "keywords";
    switch (c.operator) {
      case "equals": return hits(tokens, values, true).length > 0;
      case "not_equals": return hits(tokens, values, true).length === 0;
      case "contains": return hits(tokens, values, list).length > 0;
      case "not_contains": return hits(tokens, values, list).length === 0;
      default: return false;
    }
  }

  function scheduled(rule, now) {
    if (typeof rule.start === "number" && now < rule.start) return false;
    if (typeof rule.end === "number" && now > rule.end) return false;
    return true;
  }

  function fires(rule, t) {
    if (rule.rae && !adsEnabled(t)) return false;
    if (!rule.conds.length) return false;
    var results = rule.conds.map(function (c) { return evalCond(c, t); });
    return rule.lOp === "OR"
      ? results.some(function (r) { return r; })
      : results.every(function (r) { return r; });
  }

  function inject(sel, act) {
    var key = act + "\u0000" + sel;
    if (applied[key]) return;
    // Throws on a malformed selector before anything is injected.
    document.querySelector(sel);
    var show = act === "show";
    var css = sel + " { display: " + (show ? "block" : "none") + " !important; " +
      "visibility: " + (show ? "visible" : "hidden") + " !important; " +
      "pointer-events: " + (show ? "auto" : "none") + " !important;" +
      (show ? "" : " height: 0 !important; margin: 0 !important; padding: 0 !important;") + " }";
    var s = document.createElement("style");
    s.setAttribute("data-adex", act);
    s.textContent = css;
    (document.head || document.documentElement).appendChild(s);
    applied[key] = true;
  }

  function run() {
    var t = descriptor();
    if (!t || !rules.length) return;
    var now = Date.now();
    for (var i = 0; i < rules.length; i++) {
      var rule = rules[i];
      try {
        if (scheduled(rule, now) && fires(rule, t)) inject(rule.sel, rule.act);
      } catch (e) {
        if (window.console) console.warn("AdExclusion: rule '" + rule.name + "' failed", e);
      }
    }
  }

  if (document.readyState === "loading") {
    document.addEventListener("DOMContentLoaded", run);
  } else {
    run();
  }
"#;
