//! End-to-end completion and hover scenarios over realistic descriptions.

use ntd_analysis::{CompletionCandidate, Engine, Position, TriggerKind};

const NETWORK: &str = "\
// two-neuron demo network
GRP=[(gid=g1, typ=lcl, thd=2)],
NRN=[
  (nid=in-1, grp=g1, thr=1.0mV,
   WDF=(fnc=exp, hlf=10ms),
   LOC=(cst=cl, rad=5um, ang=0deg, hgt=0um)),
  (nid=out-1, grp=g1)
],
CON=[(pre=in-1, pst=out-1, wgt=0.5, dly=1ms, lid=l1)],
LRN=[(lid=l1, fnc=stdph, inh=0.5, exc=1.0)]
";

fn engine() -> Engine {
    Engine::standard().expect("standard engine")
}

fn labels(items: &[CompletionCandidate]) -> Vec<&str> {
    items.iter().map(|item| item.label.as_str()).collect()
}

fn end_of(text: &str) -> Position {
    let line = text.lines().count().saturating_sub(1);
    let column = text.lines().last().map_or(0, |last| last.chars().count());
    Position::new(line, column)
}

#[test]
fn comma_after_neuron_id_lists_neuron_fields() {
    let text = "NRN=[\n  (nid=in-1,";
    let items = engine().complete(text, end_of(text), TriggerKind::Character(','));
    let labels = labels(&items);
    assert_eq!(
        &labels[..7],
        ["nid=", "grp=", "inh=true", "inh=false", "thr=1.0mV", "rst=0.0mV", "rfp=2ms"]
    );
    assert!(labels.contains(&"LOC"));
}

#[test]
fn exponential_decay_block_offers_its_own_fields() {
    let text = "NRN=[(nid=a, WDF=(fnc=exp, ";
    let items = engine().complete(text, end_of(text), TriggerKind::Invoked);
    let labels = labels(&items);
    assert!(labels.contains(&"hlf=10ms"));
    assert!(!labels.contains(&"fnc=zer"));
    assert!(!labels.contains(&"rte=0.011/ms"));
}

#[test]
fn hover_on_coordinate_system_in_a_full_network() {
    let line = NETWORK
        .lines()
        .position(|line| line.contains("cst=cl"))
        .unwrap();
    let column = NETWORK.lines().nth(line).unwrap().find("cst").unwrap() + 1;
    let hover = engine()
        .hover(NETWORK, Position::new(line, column))
        .expect("cst resolves");
    assert_eq!(hover.key, "cst");
    assert!(hover.description.contains("cylindrical"));
}

#[test]
fn hover_on_learning_selector_value() {
    let line = NETWORK.lines().position(|line| line.starts_with("LRN")).unwrap();
    let column = NETWORK.lines().nth(line).unwrap().find("stdph").unwrap() + 2;
    let hover = engine().hover(NETWORK, Position::new(line, column)).unwrap();
    assert_eq!(hover.key, "fnc");
    assert_eq!(hover.title, "learning function");
}

#[test]
fn shared_name_without_evidence_gets_nothing() {
    let text = "NRN=[(nid=a, LOC=(rad=";
    let engine = engine();
    assert!(engine.complete(text, end_of(text), TriggerKind::Invoked).is_empty());
    let hover_text = "NRN=[(nid=a, LOC=(rad=4um))]";
    assert!(engine.hover(hover_text, Position::new(0, 19)).is_none());
}

#[test]
fn selector_declared_earlier_in_the_section_is_reused() {
    let text = "NRN=[(nid=a,LOC=(cst=sp,rad=1um)),\n(nid=b,LOC=(cst=,";
    let items = engine().complete(text, end_of(text), TriggerKind::Invoked);
    assert!(labels(&items).contains(&"azm=0deg"), "{:?}", labels(&items));
}

#[test]
fn after_the_last_section_offers_new_sections() {
    let items = engine().complete(NETWORK, end_of(NETWORK), TriggerKind::Invoked);
    assert_eq!(labels(&items), ["GRP", "NRN", "CON", "LRN"]);
    assert!(items.iter().all(|item| item.text().starts_with(',')));
}

#[test]
fn cursor_inside_a_trailing_comment_gets_nothing() {
    let text = "GRP=[(gid=g1, // typing here";
    assert!(engine()
        .complete(text, end_of(text), TriggerKind::Invoked)
        .is_empty());
}

#[test]
fn malformed_input_degrades_to_empty() {
    let engine = engine();
    for text in ["]]]", "NRN=[(nid=a,WDF=(fnc=sigmoid,", "=,=,(", "GRP=[(gid=g1))"] {
        assert!(
            engine
                .complete(text, end_of(text), TriggerKind::Invoked)
                .is_empty(),
            "{text}"
        );
    }
}
