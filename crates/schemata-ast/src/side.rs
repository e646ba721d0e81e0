//! Side projections
//!
//! `from_side` strips a schema down to its input (encoded) shape, `to_side`
//! down to its output (type) shape. Both walk through composites and stop at
//! transformations. Results are cached on the node, so repeated projection
//! of the same schema is free and returns the same handle.

use crate::ast::{
    Ast, AstKind, Declaration, Element, IndexSignature, PropertySignature, Refinement, Side, Tuple,
    TypeLiteral,
};
use crate::annotations::Annotations;

impl Ast {
    /// Input shape of the schema: transformations replaced by their source,
    /// refinements dropped
    #[must_use]
    pub fn from_side(&self) -> Ast {
        project(self, Side::From)
    }

    /// Output shape of the schema: transformations replaced by their target,
    /// refinements kept
    #[must_use]
    pub fn to_side(&self) -> Ast {
        project(self, Side::To)
    }

    /// Peel off every refinement at the top of the schema
    #[must_use]
    pub fn drop_right_refinement(&self) -> Ast {
        match self.kind() {
            AstKind::Refinement(refinement) => refinement.from.drop_right_refinement(),
            _ => self.clone(),
        }
    }
}

fn project(ast: &Ast, side: Side) -> Ast {
    ast.projection_cell(side)
        .get_or_init(|| compute(ast, side))
        .clone()
        .unwrap_or_else(|| ast.clone())
}

fn side_of(ast: &Ast, side: Side) -> (Ast, bool) {
    let projected = project(ast, side);
    let changed = !projected.ptr_eq(ast);
    (projected, changed)
}

// Rebuilt composites keep their annotations on the type side only; the
// encoded side describes a different value.
fn rebuilt(ast: &Ast, kind: AstKind, side: Side) -> Ast {
    match side {
        Side::To => Ast::with_annotations(kind, ast.annotations().clone()),
        Side::From => Ast::with_annotations(kind, Annotations::new()),
    }
}

fn compute(ast: &Ast, side: Side) -> Option<Ast> {
    match ast.kind() {
        AstKind::Transform(transform) => Some(match side {
            Side::From => project(&transform.from, side),
            Side::To => project(&transform.to, side),
        }),
        AstKind::Refinement(refinement) => match side {
            Side::From => Some(project(&refinement.from, side)),
            Side::To => {
                let (from, changed) = side_of(&refinement.from, side);
                changed.then(|| {
                    rebuilt(
                        ast,
                        AstKind::Refinement(Refinement {
                            from,
                            filter: refinement.filter.clone(),
                        }),
                        side,
                    )
                })
            }
        },
        AstKind::Tuple(tuple) => {
            let mut changed = false;
            let elements = tuple
                .elements
                .iter()
                .map(|element| {
                    let (ty, c) = side_of(&element.ty, side);
                    changed |= c;
                    Element {
                        ty,
                        optional: element.optional,
                    }
                })
                .collect();
            let rest = tuple
                .rest
                .iter()
                .map(|ty| {
                    let (ty, c) = side_of(ty, side);
                    changed |= c;
                    ty
                })
                .collect();
            changed.then(|| rebuilt(ast, AstKind::Tuple(Tuple::new(elements, rest)), side))
        }
        AstKind::TypeLiteral(literal) => {
            let mut changed = false;
            let property_signatures: Vec<PropertySignature> = literal
                .property_signatures()
                .iter()
                .map(|ps| {
                    let (ty, c) = side_of(&ps.ty, side);
                    changed |= c;
                    PropertySignature { ty, ..ps.clone() }
                })
                .collect();
            let index_signatures: Vec<IndexSignature> = literal
                .index_signatures()
                .iter()
                .map(|is| {
                    let (parameter, c1) = side_of(&is.parameter, side);
                    let (ty, c2) = side_of(&is.ty, side);
                    changed |= c1 || c2;
                    IndexSignature { parameter, ty }
                })
                .collect();
            if !changed {
                return None;
            }
            // Keys and parameters are unchanged in kind, so the checks in
            // `TypeLiteral::new` cannot fail here.
            let literal = TypeLiteral::new(property_signatures, index_signatures).ok()?;
            Some(rebuilt(ast, AstKind::TypeLiteral(literal), side))
        }
        AstKind::Union(union) => {
            let mut changed = false;
            let members: Vec<Ast> = union
                .members()
                .iter()
                .map(|member| {
                    let (member, c) = side_of(member, side);
                    changed |= c;
                    member
                })
                .collect();
            changed.then(|| {
                let union = Ast::union(members);
                match side {
                    Side::To => union.annotate_all(ast.annotations()),
                    Side::From => union,
                }
            })
        }
        AstKind::Lazy(lazy) => {
            let original = lazy.clone();
            let projected = Ast::lazy(move || project(original.resolve(), side));
            Some(match side {
                Side::To => projected.annotate_all(ast.annotations()),
                Side::From => projected,
            })
        }
        AstKind::Declaration(declaration) => {
            let mut changed = false;
            let type_parameters = declaration
                .type_parameters
                .iter()
                .map(|ty| {
                    let (ty, c) = side_of(ty, side);
                    changed |= c;
                    ty
                })
                .collect();
            changed.then(|| {
                rebuilt(
                    ast,
                    AstKind::Declaration(Declaration {
                        type_parameters,
                        decode: declaration.decode.clone(),
                        encode: declaration.encode.clone(),
                    }),
                    side,
                )
            })
        }
        AstKind::Keyword(_)
        | AstKind::Literal(_)
        | AstKind::UniqueSymbol(_)
        | AstKind::Enums(_)
        | AstKind::TemplateLiteral(_) => None,
    }
}
