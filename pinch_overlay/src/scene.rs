//! Demo scene: a small hit-testable element tree standing in for the
//! visualization the pointer drives.
//!
//! Elements are stored in paint order (root first, then links, then nodes or
//! tiles), so hit testing walks the list backwards and the first hit is the
//! topmost element.  Every element except the root has a parent; clicks and
//! moves bubble up that chain, enter/leave stay on the target.
//!
//! | Layout | Elements | Click |
//! |---|---|---|
//! | `sankey` | three node columns joined by link bands | select source/target, highlight path |
//! | `graph`  | ring of nodes with a few chords | select up to two nodes (oldest evicted), highlight shortest path |
//! | `tiles`  | 8×5 choropleth grid | toggle selection |

use std::collections::{HashMap, VecDeque};
use std::fmt;

use clap::ValueEnum;
use tracing::debug;

use pinch_core::{EventKind, HandLabel, PointerEvent, ScreenPoint, UiHost};

pub type ElementId = usize;

/// The panel behind everything; what a click on empty panel space hits.
pub const ROOT: ElementId = 0;

const DELIVERY_LOG_CAP: usize = 256;

// ════════════════════════════════════════════════════════════════════════════
// Geometry
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Rect    { x: f32, y: f32, w: f32, h: f32 },
    Circle  { cx: f32, cy: f32, r: f32 },
    /// A thick line, for link bands.
    Segment { x0: f32, y0: f32, x1: f32, y1: f32, half_width: f32 },
}

impl Shape {
    pub fn contains(&self, p: ScreenPoint) -> bool {
        match *self {
            Shape::Rect { x, y, w, h } => p.x >= x && p.x < x + w && p.y >= y && p.y < y + h,
            Shape::Circle { cx, cy, r } => {
                let (dx, dy) = (p.x - cx, p.y - cy);
                dx * dx + dy * dy <= r * r
            }
            Shape::Segment { x0, y0, x1, y1, half_width } => {
                let (vx, vy) = (x1 - x0, y1 - y0);
                let len2 = vx * vx + vy * vy;
                let t = if len2 > 0.0 {
                    (((p.x - x0) * vx + (p.y - y0) * vy) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let (dx, dy) = (p.x - (x0 + t * vx), p.y - (y0 + t * vy));
                dx * dx + dy * dy <= half_width * half_width
            }
        }
    }

    pub fn center(&self) -> ScreenPoint {
        match *self {
            Shape::Rect { x, y, w, h } => ScreenPoint::new(x + w / 2.0, y + h / 2.0),
            Shape::Circle { cx, cy, .. } => ScreenPoint::new(cx, cy),
            Shape::Segment { x0, y0, x1, y1, .. } => ScreenPoint::new((x0 + x1) / 2.0, (y0 + y1) / 2.0),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Elements
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum SceneKind {
    Sankey,
    Graph,
    Tiles,
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SceneKind::Sankey => "sankey",
            SceneKind::Graph  => "graph",
            SceneKind::Tiles  => "tiles",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Root,
    Node,
    Link,
    Tile,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub id:         ElementId,
    pub parent:     Option<ElementId>,
    pub role:       Role,
    pub label:      String,
    pub shape:      Shape,
    /// Sankey column, 0 for the source side.  Unused elsewhere.
    pub depth:      usize,
    /// 0–1; tile shade.
    pub value:      f32,
    /// Number of hands currently hovering.
    pub hovered_by: u8,
    pub selected:   bool,
    pub on_path:    bool,
    /// Clicks received, at target or bubbled.
    pub clicks:     u32,
}

impl Element {
    pub fn hovered(&self) -> bool {
        self.hovered_by > 0
    }
}

/// One event as an element received it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Delivery {
    pub element:   ElementId,
    pub kind:      EventKind,
    pub hand:      HandLabel,
    /// `false` when the element got it by bubbling.
    pub at_target: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Link {
    id:   ElementId,
    from: ElementId,
    to:   ElementId,
}

// ════════════════════════════════════════════════════════════════════════════
// Scene
// ════════════════════════════════════════════════════════════════════════════

pub struct Scene {
    kind:       SceneKind,
    elements:   Vec<Element>,
    links:      Vec<Link>,
    selection:  VecDeque<ElementId>,
    /// Sankey source and target slots.
    ends:       [Option<ElementId>; 2],
    deliveries: VecDeque<Delivery>,
}

impl Scene {
    /// Lay out `kind` in a panel centred on a `width × height` canvas.
    pub fn new(kind: SceneKind, width: f32, height: f32) -> Self {
        let panel = Shape::Rect { x: width * 0.1, y: height * 0.12, w: width * 0.8, h: height * 0.76 };
        let mut scene = Scene {
            kind,
            elements:   Vec::new(),
            links:      Vec::new(),
            selection:  VecDeque::new(),
            ends:       [None, None],
            deliveries: VecDeque::new(),
        };
        scene.push(None, Role::Root, kind.to_string(), panel);

        match kind {
            SceneKind::Sankey => scene.layout_sankey(panel),
            SceneKind::Graph  => scene.layout_graph(panel),
            SceneKind::Tiles  => scene.layout_tiles(panel),
        }
        debug!(%kind, elements = scene.elements.len(), "scene laid out");
        scene
    }

    fn push(&mut self, parent: Option<ElementId>, role: Role, label: String, shape: Shape) -> ElementId {
        let id = self.elements.len();
        self.elements.push(Element {
            id,
            parent,
            role,
            label,
            shape,
            depth: 0,
            value: 0.0,
            hovered_by: 0,
            selected: false,
            on_path: false,
            clicks: 0,
        });
        id
    }

    fn layout_sankey(&mut self, panel: Shape) {
        let Shape::Rect { x, y, w, h } = panel else { return };
        const NODE_W: f32 = 28.0;
        let columns: [&[&str]; 3] = [&["SRC A", "SRC B"], &["MID 1", "MID 2", "MID 3"], &["OUT X", "OUT Y"]];
        let flows: [(usize, usize, usize, usize); 8] = [
            (0, 0, 1, 0), (0, 0, 1, 1), (0, 1, 1, 1), (0, 1, 1, 2),
            (1, 0, 2, 0), (1, 1, 2, 0), (1, 1, 2, 1), (1, 2, 2, 1),
        ];

        let mut rects = Vec::new();
        for (c, names) in columns.iter().enumerate() {
            let cx = x + 40.0 + c as f32 * (w - 80.0 - NODE_W) / 2.0;
            let slot = (h - 40.0) / names.len() as f32;
            let col: Vec<Shape> = (0..names.len())
                .map(|i| Shape::Rect { x: cx, y: y + 20.0 + i as f32 * slot + slot * 0.15, w: NODE_W, h: slot * 0.7 })
                .collect();
            rects.push(col);
        }

        // Links go in before nodes so nodes paint (and hit) on top.
        let mut pending = Vec::new();
        for &(c0, i0, c1, i1) in &flows {
            let (a, b) = (rects[c0][i0].center(), rects[c1][i1].center());
            let shape = Shape::Segment { x0: a.x, y0: a.y, x1: b.x, y1: b.y, half_width: 6.0 };
            let label = format!("{} > {}", columns[c0][i0], columns[c1][i1]);
            let id = self.push(Some(ROOT), Role::Link, label, shape);
            pending.push((id, c0, i0, c1, i1));
        }

        let mut node_ids: Vec<Vec<ElementId>> = Vec::new();
        for (c, names) in columns.iter().enumerate() {
            node_ids.push(
                names
                    .iter()
                    .enumerate()
                    .map(|(i, n)| {
                        let id = self.push(Some(ROOT), Role::Node, n.to_string(), rects[c][i]);
                        self.elements[id].depth = c;
                        id
                    })
                    .collect(),
            );
        }
        for (id, c0, i0, c1, i1) in pending {
            self.links.push(Link { id, from: node_ids[c0][i0], to: node_ids[c1][i1] });
        }
    }

    fn layout_graph(&mut self, panel: Shape) {
        const NODES: usize = 8;
        const EDGES: [(usize, usize); 10] =
            [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 6), (6, 7), (7, 0), (0, 4), (2, 6)];

        let c = panel.center();
        let Shape::Rect { w, h, .. } = panel else { return };
        let radius = 0.38 * w.min(h);
        let centers: Vec<ScreenPoint> = (0..NODES)
            .map(|i| {
                let a = i as f32 / NODES as f32 * std::f32::consts::TAU - std::f32::consts::FRAC_PI_2;
                ScreenPoint::new(c.x + radius * a.cos(), c.y + radius * a.sin())
            })
            .collect();

        let mut pending = Vec::new();
        for &(a, b) in &EDGES {
            let (p, q) = (centers[a], centers[b]);
            let shape = Shape::Segment { x0: p.x, y0: p.y, x1: q.x, y1: q.y, half_width: 4.0 };
            let id = self.push(Some(ROOT), Role::Link, format!("{}-{}", node_name(a), node_name(b)), shape);
            pending.push((id, a, b));
        }
        let nodes: Vec<ElementId> = centers
            .iter()
            .enumerate()
            .map(|(i, p)| self.push(Some(ROOT), Role::Node, node_name(i), Shape::Circle { cx: p.x, cy: p.y, r: 22.0 }))
            .collect();
        for (id, a, b) in pending {
            self.links.push(Link { id, from: nodes[a], to: nodes[b] });
        }
    }

    fn layout_tiles(&mut self, panel: Shape) {
        const COLS: usize = 8;
        const ROWS: usize = 5;
        const GAP: f32 = 4.0;
        let Shape::Rect { x, y, w, h } = panel else { return };
        let (tw, th) = (w / COLS as f32, h / ROWS as f32);

        for r in 0..ROWS {
            for c in 0..COLS {
                let shape = Shape::Rect {
                    x: x + c as f32 * tw + GAP / 2.0,
                    y: y + r as f32 * th + GAP / 2.0,
                    w: tw - GAP,
                    h: th - GAP,
                };
                let id = self.push(Some(ROOT), Role::Tile, format!("R{r}C{c}"), shape);
                self.elements[id].value = ((c * 7 + r * 13) % 10) as f32 / 9.0;
            }
        }
    }

    // ── Selection ─────────────────────────────────────────────────────────

    fn activate(&mut self, target: ElementId) {
        let role = self.elements[target].role;
        match (self.kind, role) {
            (SceneKind::Sankey, Role::Node) => self.toggle_end(target),
            (SceneKind::Graph, Role::Node) => self.toggle_node(target),
            (SceneKind::Tiles, Role::Tile) => {
                let tile = &mut self.elements[target];
                tile.selected = !tile.selected;
            }
            _ => {}
        }
    }

    /// At most two nodes stay selected; a third evicts the oldest.
    fn toggle_node(&mut self, id: ElementId) {
        if let Some(pos) = self.selection.iter().position(|&s| s == id) {
            self.selection.remove(pos);
            self.elements[id].selected = false;
        } else {
            if self.selection.len() == 2 {
                if let Some(old) = self.selection.pop_front() {
                    self.elements[old].selected = false;
                }
            }
            self.selection.push_back(id);
            self.elements[id].selected = true;
        }
        self.refresh_path();
    }

    /// Sankey: a source-column node toggles the source slot, any other node
    /// the target slot.  The selection lists the source first.
    fn toggle_end(&mut self, id: ElementId) {
        let side = usize::from(self.elements[id].depth != 0);
        let previous = self.ends[side].take();
        if let Some(old) = previous {
            self.elements[old].selected = false;
        }
        if previous != Some(id) {
            self.ends[side] = Some(id);
            self.elements[id].selected = true;
        }
        self.selection = self.ends.iter().flatten().copied().collect();
        self.refresh_path();
    }

    fn refresh_path(&mut self) {
        for e in &mut self.elements {
            e.on_path = false;
        }
        let (Some(&a), Some(&b)) = (self.selection.front(), self.selection.get(1)) else { return };
        if let Some(path) = self.shortest_path(a, b) {
            for id in path {
                self.elements[id].on_path = true;
            }
        }
    }

    /// Breadth-first search over links, ignoring direction.  Returns the
    /// nodes and links on the path, or `None` when unconnected.
    pub fn shortest_path(&self, from: ElementId, to: ElementId) -> Option<Vec<ElementId>> {
        let mut prev: HashMap<ElementId, (ElementId, ElementId)> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        let mut seen = vec![false; self.elements.len()];
        seen[from] = true;

        while let Some(n) = queue.pop_front() {
            if n == to {
                let mut path = vec![to];
                let mut cur = to;
                while let Some(&(p, link)) = prev.get(&cur) {
                    path.push(link);
                    path.push(p);
                    cur = p;
                }
                return Some(path);
            }
            for l in &self.links {
                let next = if l.from == n {
                    l.to
                } else if l.to == n {
                    l.from
                } else {
                    continue;
                };
                if !seen[next] {
                    seen[next] = true;
                    prev.insert(next, (n, l.id));
                    queue.push_back(next);
                }
            }
        }
        None
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn kind(&self) -> SceneKind {
        self.kind
    }

    /// In paint order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn find(&self, label: &str) -> Option<ElementId> {
        self.elements.iter().find(|e| e.label == label).map(|e| e.id)
    }

    pub fn selection(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.selection.iter().copied()
    }

    /// Most recent deliveries, oldest first.
    pub fn deliveries(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter()
    }

    pub fn describe(&self, id: ElementId) -> String {
        match self.elements.get(id) {
            Some(e) if e.role == Role::Root => "background".to_string(),
            Some(e) => e.label.clone(),
            None => format!("#{id}"),
        }
    }

    fn record(&mut self, delivery: Delivery) {
        if self.deliveries.len() == DELIVERY_LOG_CAP {
            self.deliveries.pop_front();
        }
        self.deliveries.push_back(delivery);
    }
}

fn node_name(i: usize) -> String {
    char::from(b'A' + i as u8).to_string()
}

// ════════════════════════════════════════════════════════════════════════════
// UiHost
// ════════════════════════════════════════════════════════════════════════════

impl UiHost for Scene {
    type Element = ElementId;

    fn hit_test(&self, point: ScreenPoint) -> Option<ElementId> {
        self.elements
            .iter()
            .rev()
            .find(|e| e.shape.contains(point))
            .map(|e| e.id)
    }

    fn dispatch(&mut self, target: &ElementId, event: &PointerEvent) {
        let target = *target;
        if target >= self.elements.len() {
            return;
        }

        match event.kind {
            EventKind::PointerEnter => {
                let e = &mut self.elements[target];
                e.hovered_by = e.hovered_by.saturating_add(1);
            }
            EventKind::PointerLeave => {
                let e = &mut self.elements[target];
                e.hovered_by = e.hovered_by.saturating_sub(1);
            }
            EventKind::Click => self.activate(target),
            EventKind::PointerMove => {}
        }

        let mut current = Some(target);
        while let Some(id) = current {
            if event.kind == EventKind::Click {
                self.elements[id].clicks += 1;
            }
            self.record(Delivery { element: id, kind: event.kind, hand: event.hand, at_target: id == target });
            if !event.bubbles {
                break;
            }
            current = self.elements[id].parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind, at: ScreenPoint) -> PointerEvent {
        PointerEvent::new(kind, at, HandLabel::Right, 0)
    }

    fn click(scene: &mut Scene, id: ElementId) {
        let at = scene.elements[id].shape.center();
        scene.dispatch(&id, &event(EventKind::Click, at));
    }

    #[test]
    fn shapes_contain_their_centres() {
        let shapes = [
            Shape::Rect { x: 0.0, y: 0.0, w: 10.0, h: 10.0 },
            Shape::Circle { cx: 5.0, cy: 5.0, r: 1.0 },
            Shape::Segment { x0: 0.0, y0: 0.0, x1: 10.0, y1: 0.0, half_width: 2.0 },
        ];
        for s in shapes {
            assert!(s.contains(s.center()), "{s:?}");
        }
        let seg = shapes[2];
        assert!(seg.contains(ScreenPoint::new(10.0, 1.9)));
        assert!(!seg.contains(ScreenPoint::new(12.5, 0.0)));
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let scene = Scene::new(SceneKind::Graph, 1280.0, 720.0);
        let a = scene.find("A").unwrap();
        // A's centre also lies on the A-B link; the node wins.
        assert_eq!(scene.hit_test(scene.elements[a].shape.center()), Some(a));
        // Panel corner: background.
        assert_eq!(scene.hit_test(ScreenPoint::new(130.0, 88.0)), Some(ROOT));
        // Outside the panel: nothing.
        assert_eq!(scene.hit_test(ScreenPoint::new(5.0, 5.0)), None);
    }

    #[test]
    fn click_bubbles_but_hover_does_not() {
        let mut scene = Scene::new(SceneKind::Tiles, 1280.0, 720.0);
        let tile = scene.find("R0C0").unwrap();
        let at = scene.elements[tile].shape.center();

        scene.dispatch(&tile, &event(EventKind::PointerEnter, at));
        scene.dispatch(&tile, &event(EventKind::Click, at));

        let got: Vec<(ElementId, EventKind, bool)> =
            scene.deliveries().map(|d| (d.element, d.kind, d.at_target)).collect();
        assert_eq!(
            got,
            vec![
                (tile, EventKind::PointerEnter, true),
                (tile, EventKind::Click, true),
                (ROOT, EventKind::Click, false),
            ]
        );
        assert_eq!(scene.elements[ROOT].clicks, 1);
        assert!(scene.elements[tile].hovered());
    }

    #[test]
    fn hover_counts_per_hand() {
        let mut scene = Scene::new(SceneKind::Tiles, 1280.0, 720.0);
        let t = scene.find("R2C3").unwrap();
        let at = scene.elements[t].shape.center();
        scene.dispatch(&t, &event(EventKind::PointerEnter, at));
        scene.dispatch(&t, &PointerEvent::new(EventKind::PointerEnter, at, HandLabel::Left, 0));
        scene.dispatch(&t, &event(EventKind::PointerLeave, at));
        assert_eq!(scene.elements[t].hovered_by, 1);
        scene.dispatch(&t, &event(EventKind::PointerLeave, at));
        scene.dispatch(&t, &event(EventKind::PointerLeave, at));
        assert!(!scene.elements[t].hovered());
    }

    #[test]
    fn tile_click_toggles() {
        let mut scene = Scene::new(SceneKind::Tiles, 1280.0, 720.0);
        let t = scene.find("R4C7").unwrap();
        click(&mut scene, t);
        assert!(scene.elements[t].selected);
        click(&mut scene, t);
        assert!(!scene.elements[t].selected);
    }

    #[test]
    fn graph_selects_two_and_highlights_path() {
        let mut scene = Scene::new(SceneKind::Graph, 1280.0, 720.0);
        let (a, b, c, e) = (
            scene.find("A").unwrap(),
            scene.find("B").unwrap(),
            scene.find("C").unwrap(),
            scene.find("E").unwrap(),
        );
        let ae = scene.find("A-E").unwrap();

        click(&mut scene, a);
        click(&mut scene, e);
        assert_eq!(scene.selection().collect::<Vec<_>>(), vec![a, e]);
        let on_path: Vec<ElementId> = scene.elements().iter().filter(|x| x.on_path).map(|x| x.id).collect();
        assert_eq!(on_path, vec![ae, a, e]);

        // Third pick evicts the oldest.
        click(&mut scene, b);
        assert_eq!(scene.selection().collect::<Vec<_>>(), vec![e, b]);
        assert!(!scene.elements[a].selected);

        // Deselect one: no path left.
        click(&mut scene, b);
        assert!(scene.elements().iter().all(|x| !x.on_path));
        assert!(!scene.elements[c].selected);
    }

    #[test]
    fn sankey_path_crosses_middle_column() {
        let scene = Scene::new(SceneKind::Sankey, 1280.0, 720.0);
        let src = scene.find("SRC A").unwrap();
        let out = scene.find("OUT Y").unwrap();
        let path = scene.shortest_path(src, out).unwrap();
        // node, link, node, link, node
        assert_eq!(path.len(), 5);
        assert_eq!(path[0], out);
        assert_eq!(path[4], src);
        assert_eq!(scene.describe(path[2]), "MID 2");
    }

    #[test]
    fn sankey_keeps_one_source_and_one_target() {
        let mut scene = Scene::new(SceneKind::Sankey, 1280.0, 720.0);
        let (src_a, src_b, mid_2, out_y) = (
            scene.find("SRC A").unwrap(),
            scene.find("SRC B").unwrap(),
            scene.find("MID 2").unwrap(),
            scene.find("OUT Y").unwrap(),
        );

        click(&mut scene, src_a);
        click(&mut scene, src_b);
        assert_eq!(scene.selection().collect::<Vec<_>>(), vec![src_b]);
        assert!(!scene.elements[src_a].selected);
        assert!(scene.elements().iter().all(|x| !x.on_path));

        click(&mut scene, out_y);
        assert_eq!(scene.selection().collect::<Vec<_>>(), vec![src_b, out_y]);
        assert!(scene.elements[mid_2].on_path);

        // Another target replaces the first; the source stays.
        click(&mut scene, mid_2);
        assert_eq!(scene.selection().collect::<Vec<_>>(), vec![src_b, mid_2]);
        assert!(!scene.elements[out_y].selected);

        // Clicking the target again clears that side only.
        click(&mut scene, mid_2);
        assert_eq!(scene.selection().collect::<Vec<_>>(), vec![src_b]);
        assert!(scene.elements().iter().all(|x| !x.on_path));
    }

    #[test]
    fn background_click_changes_nothing() {
        let mut scene = Scene::new(SceneKind::Graph, 1280.0, 720.0);
        let a = scene.find("A").unwrap();
        click(&mut scene, a);
        click(&mut scene, ROOT);
        assert_eq!(scene.selection().collect::<Vec<_>>(), vec![a]);
        assert_eq!(scene.describe(ROOT), "background");
    }
}
