//! Prompt templates for scene generation.

use rand::{Rng, seq::IndexedRandom as _};

use crate::{classify::Classification, record::ProductRecord};

/// Where in a home the product is staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomContext {
    pub room_type: &'static str,
    pub room_description: &'static str,
    pub placement: &'static str,
    pub context: &'static str,
}

const fn room(
    room_type: &'static str,
    room_description: &'static str,
    placement: &'static str,
    context: &'static str,
) -> RoomContext {
    RoomContext {
        room_type,
        room_description,
        placement,
        context,
    }
}

const WINE_AND_BAR: &[RoomContext] = &[
    room(
        "dining room",
        "sophisticated dining room with elegant table setting visible in background",
        "positioned along the wall as a statement piece",
        "fine dining table with chairs, elegant chandelier overhead",
    ),
    room(
        "living room",
        "upscale living room with comfortable seating area",
        "featured prominently near the seating area",
        "plush sofa, armchairs, coffee table with books",
    ),
    room(
        "home entertainment area",
        "dedicated home bar or entertainment space",
        "as the centerpiece of the entertainment area",
        "bar stools, ambient lighting, tasteful wall art",
    ),
];

const CURIO_AND_DISPLAY: &[RoomContext] = &[
    room(
        "living room",
        "elegant living room with refined furnishings",
        "displayed prominently as a focal point",
        "comfortable seating, side tables, decorative accessories visible inside the cabinet",
    ),
    room(
        "dining room",
        "formal dining room with sophisticated ambiance",
        "featured elegantly against the wall",
        "dining table in background, fine china or collectibles visible inside the cabinet",
    ),
    room(
        "entryway or foyer",
        "grand entryway with welcoming atmosphere",
        "showcased as a statement piece",
        "elegant mirror, console table, decorative items displayed inside the cabinet",
    ),
];

const FLOOR_CLOCK: &[RoomContext] = &[
    room(
        "living room",
        "classic living room with timeless elegance",
        "standing majestically as a centerpiece",
        "traditional furniture, area rug, the clock commanding attention",
    ),
    room(
        "entryway or foyer",
        "grand entryway with welcoming presence",
        "positioned impressively to greet visitors",
        "elegant console table, mirror, the clock as a statement piece",
    ),
    room(
        "home library or study",
        "distinguished library or study with rich character",
        "standing prominently in a corner or along the wall",
        "bookshelves, leather furniture, warm wood tones",
    ),
];

const WALL_CLOCK: &[RoomContext] = &[room(
    "living room or dining room",
    "well-appointed room with classic style",
    "mounted prominently on the wall at eye level",
    "complementary furniture below, balanced room composition",
)];

const MANTEL_CLOCK: &[RoomContext] = &[room(
    "living room",
    "cozy living room with fireplace",
    "displayed elegantly on the fireplace mantel",
    "comfortable seating, fireplace, the clock as a mantel centerpiece",
)];

const OTHER_CLOCK: &[RoomContext] = &[room(
    "living room or study",
    "refined interior space",
    "positioned prominently on a side table or shelf",
    "tasteful furniture, the clock clearly visible",
)];

const GENERAL: &[RoomContext] = &[room(
    "living room or dining room",
    "beautifully appointed room with elegant furnishings",
    "positioned prominently as a featured piece",
    "complementary furniture and sophisticated decor",
)];

/// The candidate room contexts for a furniture type.
pub fn room_contexts(furniture_type: &str) -> &'static [RoomContext] {
    let is = |word: &str| furniture_type.contains(word);
    if is("wine") || is("bar") {
        WINE_AND_BAR
    } else if is("curio") || is("display") {
        CURIO_AND_DISPLAY
    } else if is("grandfather") || is("floor") {
        FLOOR_CLOCK
    } else if is("wall") && is("clock") {
        WALL_CLOCK
    } else if is("mantel") {
        MANTEL_CLOCK
    } else if is("clock") {
        OTHER_CLOCK
    } else {
        GENERAL
    }
}

/// Pick one room context uniformly at random.
pub fn room_context<R: Rng + ?Sized>(furniture_type: &str, rng: &mut R) -> RoomContext {
    let candidates = room_contexts(furniture_type);
    candidates.choose(rng).copied().unwrap_or(GENERAL[0])
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Text-to-image prompt describing the whole scene.
pub fn scene_prompt(classification: &Classification, room: &RoomContext) -> String {
    let Classification {
        furniture_type,
        sub_type,
        style,
        material,
        color,
    } = classification;
    let sub_type = sub_type.map(|s| format!(" / {s}")).unwrap_or_default();
    let heading = furniture_type.to_uppercase();
    let style = capitalize(style);
    let RoomContext {
        room_description,
        placement,
        context,
        ..
    } = room;
    format!(
        "Create a photorealistic, high-end interior design photograph featuring a {color} {material} {furniture_type}{sub_type} in a {room_description}.

THE {heading} MUST BE:
- The absolute focal point and hero of the image
- {placement}
- Fully visible from a flattering 3/4 front angle with no obstructions
- Crystal clear, sharp focus showing all intricate details
- Well-lit with professional lighting that highlights its craftsmanship
- Taking up significant visual space in the composition (prominent but not cropped)

ROOM STYLING:
- {style} interior design aesthetic
- {context}
- Multiple light sources: natural window light, subtle accent lighting, warm ambient fixtures
- Professional styling with attention to balance and negative space
- Clean, uncluttered composition that draws the eye directly to the {furniture_type}

PHOTOGRAPHY QUALITY:
- Professional interior design photography for luxury furniture catalogs
- Architectural Digest or Elle Decor editorial quality
- 8K ultra-high resolution with exceptional clarity
- Perfect exposure, color accuracy, and white balance
- Natural depth of field with slight background softness to emphasize the main piece
- Shot with professional camera and wide-angle lens

COLOR PALETTE: Rich, harmonious colors that complement the {color} tones of the {furniture_type}, creating an aspirational yet attainable space that makes the furniture piece irresistible."
    )
}

pub const NO_PEOPLE: &str = "Do not include any people in the scene.";

/// Editing prompt asking the model to stage the attached photo in a room.
pub fn placement_prompt(classification: &Classification, room: &RoomContext) -> String {
    format!(
        "Analyze the attached photo of a piece of furniture (it appears to be a {furniture}) \
         to determine its style. Then, generate a high-resolution, photorealistic image of a \
         {room_type} scene that is aesthetically appropriate for that furniture style, placing \
         the furniture item within it. The furniture should be clearly visible, so position \
         other furnishings (like the {others}) to the sides or background to ensure the main \
         item is the focal point. Keep the furniture item exactly as it appears in the photo. \
         {NO_PEOPLE}",
        furniture = classification.furniture_type,
        room_type = room.room_type,
        others = room.context,
    )
}

/// Request for a text model to improve an editing prompt.
pub fn refinement_request(original_prompt: &str, product: &ProductRecord) -> String {
    let model = product.model.as_deref().unwrap_or("N/A");
    let retail = product
        .retail
        .map(|retail| format!("{retail:.2}"))
        .unwrap_or_else(|| "N/A".to_owned());
    let mut context = format!(
        "Product Information:
- Model: {model}
- Retail Price: ${retail}
- Style/Category: Based on the product images and context
"
    );
    if let Some(link) = &product.website_link_for_context {
        context.push_str(&format!("- Product Page: {link}\n"));
    }
    format!(
        "You are an expert at writing image editing prompts for furniture and home decor products.
Improve the following prompt to be more detailed and specific for better image editing results.

{context}
Original prompt: {original_prompt}

Instructions:
1. Keep the core intent of placing the furniture in an appropriate room scene
2. Add artistic details about lighting, color harmony, and atmosphere
3. Describe the room style that would best showcase this product
4. Include quality descriptors (photorealistic, high-resolution, professional)
5. Focus on elements that would attract customers to buy this item
6. Consider the price point when describing the room setting
7. Emphasize the furniture as the focal point while creating an aspirational scene
8. The scene must not contain any people

Provide ONLY the improved prompt, nothing else. Do not include any preamble or explanation."
    )
}
