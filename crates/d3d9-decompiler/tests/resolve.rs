use d3d9_decompiler::instruction::{DclUsage, Operand, SwizzleComponent, TextureType};
use d3d9_decompiler::{
    ConstantDeclaration, ConstantTable, DecompileError, Instruction, Opcode, ParameterClass,
    ParameterType, RegisterKey, RegisterSet, RegisterState, RegisterType, ResolverOptions,
    SourceResolution, SrcModifier, Swizzle, WriteMask,
};
use pretty_assertions::assert_eq;

fn reg(ty: RegisterType, number: u32) -> RegisterKey {
    RegisterKey::new(ty, number)
}

fn temp(n: u32) -> RegisterKey {
    reg(RegisterType::Temp, n)
}

fn c(n: u32) -> RegisterKey {
    reg(RegisterType::Const, n)
}

fn xy() -> WriteMask {
    WriteMask::X | WriteMask::Y
}

fn xyz() -> WriteMask {
    WriteMask::X | WriteMask::Y | WriteMask::Z
}

fn op(opcode: Opcode, dst: RegisterKey, mask: WriteMask, srcs: &[RegisterKey]) -> Instruction {
    let mut operands = vec![Operand::dst(dst, mask)];
    operands.extend(srcs.iter().map(|s| Operand::src(*s)));
    Instruction::new(opcode, operands)
}

fn op_with(
    opcode: Opcode,
    dst: RegisterKey,
    mask: WriteMask,
    src: RegisterKey,
    swizzle: Swizzle,
    modifier: SrcModifier,
) -> Instruction {
    Instruction::new(
        opcode,
        vec![Operand::dst(dst, mask), Operand::src_with(src, swizzle, modifier)],
    )
}

fn load<'a>(table: &'a ConstantTable, program: &[Instruction]) -> RegisterState<'a> {
    RegisterState::load(table, program, ResolverOptions::default()).unwrap()
}

#[test]
fn matrix_rows_constant_is_indexed() {
    let table = ConstantTable::new(vec![
        ConstantDeclaration::matrix("c0", ParameterClass::MatrixRows, 0, 4, 4),
        ConstantDeclaration::vector("LightDir", 4, 3),
    ]);
    let read_row = op(Opcode::Mov, temp(0), WriteMask::all(), &[c(2)]);
    let read_vector = op(Opcode::Mov, temp(1), WriteMask::all(), &[c(4)]);
    let state = load(&table, &[read_row.clone(), read_vector.clone()]);

    assert_eq!(state.source_name(&read_row, 0).unwrap(), "c0[2]");
    assert_eq!(state.source_name(&read_vector, 0).unwrap(), "LightDir");
}

#[test]
fn matrix_columns_constant_uses_bare_name_as_source() {
    let table = ConstantTable::new(vec![ConstantDeclaration::matrix(
        "WorldViewProj",
        ParameterClass::MatrixColumns,
        0,
        4,
        4,
    )]);
    let dp4 = op(
        Opcode::Dp4,
        reg(RegisterType::Output, 0),
        WriteMask::X,
        &[reg(RegisterType::Input, 0), c(1)],
    );
    let program = vec![
        Instruction::dcl(DclUsage::Position, 0, reg(RegisterType::Input, 0), WriteMask::all()),
        Instruction::dcl(DclUsage::Position, 0, reg(RegisterType::Output, 0), WriteMask::all()),
        dp4.clone(),
    ];
    let state = load(&table, &program);

    assert_eq!(state.destination_name(&dp4).unwrap(), "position.x");
    assert_eq!(state.source_name(&dp4, 0).unwrap(), "position");
    assert_eq!(state.source_name(&dp4, 1).unwrap(), "WorldViewProj");
}

#[test]
fn literal_collapses_to_destination_width() {
    let def = Instruction::def(c(0), [0.25, 0.5, 0.25, 0.25]);
    let scalar = op(Opcode::Mov, temp(0), WriteMask::X, &[c(0)]);
    let vector = op(Opcode::Mov, temp(0), xyz(), &[c(0)]);
    let splat = op_with(
        Opcode::Mov,
        temp(0),
        xyz(),
        c(0),
        Swizzle::replicate(SwizzleComponent::Z),
        SrcModifier::None,
    );
    let table = ConstantTable::default();
    let state = load(&table, &[def, scalar.clone(), vector.clone(), splat.clone()]);

    assert_eq!(state.source_name(&scalar, 0).unwrap(), "0.25");
    assert_eq!(state.source_name(&vector, 0).unwrap(), "float3(0.25, 0.5, 0.25)");
    assert_eq!(state.source_name(&splat, 0).unwrap(), "0.25");
    assert_eq!(
        state.resolve_source(&vector, 0).unwrap(),
        SourceResolution::Literal("float3(0.25, 0.5, 0.25)".to_owned())
    );
}

#[test]
fn literal_reads_follow_the_write_mask() {
    // mov r0.yz, c0 reads c0.yz.
    let def = Instruction::def(c(0), [1.0, 2.0, 3.0, 4.0]);
    let inst = op(Opcode::Mov, temp(0), WriteMask::Y | WriteMask::Z, &[c(0)]);
    let table = ConstantTable::default();
    let state = load(&table, &[def, inst.clone()]);

    assert_eq!(state.source_name(&inst, 0).unwrap(), "float2(2, 3)");
}

#[test]
fn negate_applies_before_collapse() {
    let def = Instruction::def(c(1), [0.25, -0.25, 0.25, 0.25]);
    let inst = op_with(
        Opcode::Mov,
        temp(0),
        xy(),
        c(1),
        Swizzle::replicate(SwizzleComponent::X),
        SrcModifier::Negate,
    );
    let mixed = op_with(
        Opcode::Mov,
        temp(0),
        xy(),
        c(1),
        Swizzle::identity(),
        SrcModifier::Negate,
    );
    let table = ConstantTable::default();
    let state = load(&table, &[def, inst.clone(), mixed.clone()]);

    assert_eq!(state.source_name(&inst, 0).unwrap(), "-0.25");
    assert_eq!(state.source_name(&mixed, 0).unwrap(), "float2(-0.25, 0.25)");
}

#[test]
fn literal_modifiers_fold_componentwise() {
    let def = Instruction::def(c(0), [-1.0, 2.0, -3.0, 4.0]);
    let abs = op_with(
        Opcode::Mov,
        temp(0),
        WriteMask::all(),
        c(0),
        Swizzle::identity(),
        SrcModifier::Abs,
    );
    let x2neg = op_with(
        Opcode::Mov,
        temp(0),
        WriteMask::X,
        c(0),
        Swizzle::identity(),
        SrcModifier::X2Negate,
    );
    let bias = op_with(
        Opcode::Mov,
        temp(0),
        WriteMask::X,
        c(0),
        Swizzle::identity(),
        SrcModifier::Bias,
    );
    let table = ConstantTable::default();
    let state = load(&table, &[def, abs.clone(), x2neg.clone(), bias.clone()]);

    assert_eq!(state.source_name(&abs, 0).unwrap(), "float4(1, 2, 3, 4)");
    assert_eq!(state.source_name(&x2neg, 0).unwrap(), "2");
    assert!(matches!(
        state.source_name(&bias, 0),
        Err(DecompileError::UnsupportedModifier {
            modifier: SrcModifier::Bias,
            ..
        })
    ));
}

#[test]
fn integer_and_bool_literals_fold_without_destination() {
    let i0 = reg(RegisterType::ConstInt, 0);
    let b0 = reg(RegisterType::ConstBool, 0);
    let rep = Instruction::new(Opcode::Rep, vec![Operand::src(i0)]);
    let branch = Instruction::new(Opcode::If, vec![Operand::src(b0)]);
    let negated = Instruction::new(
        Opcode::Rep,
        vec![Operand::src_with(i0, Swizzle::identity(), SrcModifier::Negate)],
    );
    let program = vec![
        Instruction::defi(i0, [3, 3, 3, 3]),
        Instruction::defb(b0, true),
        rep.clone(),
        branch.clone(),
    ];
    let table = ConstantTable::default();
    let state = load(&table, &program);

    assert_eq!(state.source_name(&rep, 0).unwrap(), "3");
    assert_eq!(state.source_name(&negated, 0).unwrap(), "-3");
    assert_eq!(state.source_name(&branch, 0).unwrap(), "true");
}

#[test]
fn table_constants_of_each_kind_resolve_by_type() {
    let mut count = ConstantDeclaration::vector("LightCount", 0, 1);
    count.register_set = RegisterSet::Int4;
    count.parameter_type = ParameterType::Int;
    let mut enabled = ConstantDeclaration::vector("FogEnabled", 0, 1);
    enabled.register_set = RegisterSet::Bool;
    enabled.parameter_type = ParameterType::Bool;
    let table = ConstantTable::new(vec![count, enabled]);

    let rep = Instruction::new(Opcode::Rep, vec![Operand::src(reg(RegisterType::ConstInt, 0))]);
    let branch = Instruction::new(Opcode::If, vec![Operand::src(reg(RegisterType::ConstBool, 0))]);
    let state = load(&table, &[rep.clone(), branch.clone()]);

    assert_eq!(state.source_name(&rep, 0).unwrap(), "LightCount");
    assert_eq!(state.source_name(&branch, 0).unwrap(), "FogEnabled");
}

#[test]
fn unknown_constant_falls_back_to_placeholder() {
    let inst = op(Opcode::Mov, temp(0), WriteMask::all(), &[c(7)]);
    let rep = Instruction::new(Opcode::Rep, vec![Operand::src(reg(RegisterType::ConstInt, 2))]);
    let table = ConstantTable::default();
    let state = load(&table, &[inst.clone()]);

    let resolved = state.resolve_source(&inst, 0).unwrap();
    assert!(resolved.is_placeholder());
    assert_eq!(resolved.text(), "Error Const7");
    assert_eq!(state.source_name(&rep, 0).unwrap(), "Error ConstInt2");
}

#[test]
fn single_input_is_unqualified() {
    let v0 = reg(RegisterType::Input, 0);
    let inst = op(Opcode::Mov, temp(0), xy(), &[v0]);
    let table = ConstantTable::default();
    let state = load(
        &table,
        &[Instruction::dcl(DclUsage::TexCoord, 0, v0, xy()), inst.clone()],
    );

    assert_eq!(state.source_name(&inst, 0).unwrap(), "texcoord");
    assert_eq!(state.register_name(v0).unwrap(), "texcoord");
}

#[test]
fn multiple_inputs_are_qualified() {
    let v0 = reg(RegisterType::Input, 0);
    let v1 = reg(RegisterType::Input, 1);
    let inst = op(Opcode::Add, temp(0), WriteMask::all(), &[v0, v1]);
    let table = ConstantTable::default();
    let state = load(
        &table,
        &[
            Instruction::dcl(DclUsage::TexCoord, 0, v0, xy()),
            Instruction::dcl(DclUsage::Color, 0, v1, WriteMask::all()),
            inst.clone(),
        ],
    );

    assert_eq!(state.source_name(&inst, 0).unwrap(), "i.texcoord");
    assert_eq!(state.source_name(&inst, 1).unwrap(), "i.color");
}

#[test]
fn destination_mask_is_elided_at_declared_width() {
    let o0 = reg(RegisterType::Output, 0);
    let o1 = reg(RegisterType::Output, 1);
    let full = op(Opcode::Mov, o1, xy(), &[temp(0)]);
    let partial = op(Opcode::Mov, o1, WriteMask::Y, &[temp(0)]);
    let table = ConstantTable::default();
    let state = load(
        &table,
        &[
            Instruction::dcl(DclUsage::Position, 0, o0, WriteMask::all()),
            Instruction::dcl(DclUsage::TexCoord, 1, o1, xy()),
            op(Opcode::Mov, temp(0), WriteMask::all(), &[c(0)]),
        ],
    );

    assert_eq!(state.destination_name(&full).unwrap(), "o.texcoord1");
    assert_eq!(state.destination_name(&partial).unwrap(), "o.texcoord1.y");
}

#[test]
fn discovered_color_outputs_are_named() {
    let oc0 = reg(RegisterType::ColorOut, 0);
    let oc1 = reg(RegisterType::ColorOut, 1);
    let single = op(Opcode::Mov, oc0, WriteMask::all(), &[temp(0)]);
    let table = ConstantTable::default();

    let state = load(&table, &[single.clone()]);
    assert_eq!(state.destination_name(&single).unwrap(), "color");

    let second = op(Opcode::Mov, oc1, WriteMask::all(), &[temp(1)]);
    let state = load(&table, &[single.clone(), second.clone()]);
    assert_eq!(state.destination_name(&single).unwrap(), "o.color");
    assert_eq!(state.destination_name(&second).unwrap(), "o.color1");
}

#[test]
fn source_swizzle_and_modifier_wrap_register_name() {
    let v0 = reg(RegisterType::Input, 0);
    let yx = Swizzle([
        SwizzleComponent::Y,
        SwizzleComponent::X,
        SwizzleComponent::Z,
        SwizzleComponent::W,
    ]);
    let swapped = op_with(Opcode::Mov, temp(0), xy(), v0, yx, SrcModifier::Negate);
    let splat = op_with(
        Opcode::Mov,
        temp(0),
        WriteMask::all(),
        temp(1),
        Swizzle::replicate(SwizzleComponent::W),
        SrcModifier::Abs,
    );
    let biased = op_with(
        Opcode::Mov,
        temp(0),
        WriteMask::all(),
        temp(1),
        Swizzle::identity(),
        SrcModifier::SignNegate,
    );
    let table = ConstantTable::default();
    let state = load(
        &table,
        &[Instruction::dcl(DclUsage::TexCoord, 0, v0, xy()), swapped.clone()],
    );

    assert_eq!(state.source_name(&swapped, 0).unwrap(), "-texcoord.yx");
    assert_eq!(state.source_name(&splat, 0).unwrap(), "abs(r1.w)");
    assert_eq!(state.source_name(&biased, 0).unwrap(), "-r1_bx2");
}

#[test]
fn complement_modifier_is_unsupported_on_registers() {
    let inst = op_with(
        Opcode::Mov,
        temp(0),
        WriteMask::all(),
        temp(1),
        Swizzle::identity(),
        SrcModifier::Comp,
    );
    let table = ConstantTable::default();
    let state = load(&table, &[]);

    assert_eq!(
        state.source_name(&inst, 0),
        Err(DecompileError::UnsupportedModifier {
            modifier: SrcModifier::Comp,
            context: "register operand",
        })
    );
}

#[test]
fn constant_register_names_follow_matrix_order() {
    let table = ConstantTable::new(vec![
        ConstantDeclaration::matrix("WorldViewProj", ParameterClass::MatrixColumns, 0, 4, 4),
        ConstantDeclaration::vector("LightDir", 4, 3),
    ]);

    let column_major = load(&table, &[]);
    assert_eq!(
        column_major.register_name(c(1)).unwrap(),
        "transpose(WorldViewProj)[1]"
    );
    assert_eq!(column_major.register_name(c(4)).unwrap(), "LightDir");
    assert_eq!(column_major.register_full_length(c(4)).unwrap(), 3);
    assert_eq!(column_major.register_full_length(c(2)).unwrap(), 4);

    let row_major =
        RegisterState::load(&table, &[], ResolverOptions { column_major: false }).unwrap();
    assert_eq!(row_major.register_name(c(1)).unwrap(), "WorldViewProj[1]");
    assert_eq!(row_major.register_name(c(4)).unwrap(), "LightDir");

    assert_eq!(
        row_major.register_name(c(9)),
        Err(DecompileError::MissingDeclaration { key: c(9) })
    );
}

#[test]
fn samplers_resolve_through_the_constant_table() {
    let s0 = reg(RegisterType::Sampler, 0);
    let s1 = reg(RegisterType::Sampler, 1);
    let table = ConstantTable::new(vec![ConstantDeclaration::sampler(
        "DiffuseSampler",
        ParameterType::Sampler2D,
        0,
    )]);
    let state = load(
        &table,
        &[Instruction::dcl(
            DclUsage::TextureType(TextureType::Texture2D),
            0,
            s0,
            WriteMask::all(),
        )],
    );

    assert_eq!(state.register_name(s0).unwrap(), "DiffuseSampler");
    assert_eq!(
        state.register_name(s1),
        Err(DecompileError::MissingDeclaration { key: s1 })
    );
}

#[test]
fn misc_and_unsupported_register_kinds() {
    let table = ConstantTable::default();
    let state = load(
        &table,
        &[Instruction::dcl(
            DclUsage::Position,
            0,
            reg(RegisterType::MiscType, 1),
            xy(),
        )],
    );

    assert_eq!(state.register_name(reg(RegisterType::MiscType, 0)).unwrap(), "vFace");
    assert_eq!(state.register_name(reg(RegisterType::MiscType, 1)).unwrap(), "vPos");
    assert_eq!(
        state.register_name(reg(RegisterType::MiscType, 2)),
        Err(DecompileError::UnsupportedMiscRegister(2))
    );
    assert_eq!(
        state.register_name(reg(RegisterType::Loop, 0)),
        Err(DecompileError::UnsupportedRegisterKind(RegisterType::Loop))
    );
    // Undeclared temps and textures fall back to their positional names.
    assert_eq!(state.register_name(temp(5)).unwrap(), "r5");
    assert_eq!(state.register_name(reg(RegisterType::Texture, 2)).unwrap(), "t2");
    assert_eq!(state.register_name(reg(RegisterType::Input, 3)).unwrap(), "v3");
}

#[test]
fn undeclared_inputs_keep_positional_names() {
    // ps_1_4 reads v0/v1 without any dcl.
    let v0 = reg(RegisterType::Input, 0);
    let v1 = reg(RegisterType::Input, 1);
    let oc0 = reg(RegisterType::ColorOut, 0);
    let program = vec![
        op(Opcode::Mov, temp(0), WriteMask::all(), &[v0]),
        op(Opcode::Mul, temp(0), WriteMask::all(), &[temp(0), v1]),
        op(Opcode::Mov, oc0, WriteMask::all(), &[temp(0)]),
    ];
    let table = ConstantTable::default();
    let state = load(&table, &program);

    assert_eq!(state.source_name(&program[0], 0).unwrap(), "v0");
    assert_eq!(state.source_name(&program[1], 1).unwrap(), "v1");
    assert_eq!(state.destination_name(&program[2]).unwrap(), "color");
    assert!(state.method_inputs().is_empty());
}

#[test]
fn non_finite_literals_render_as_divisions() {
    let program = vec![
        Instruction::def(c(1), [f32::INFINITY, f32::NAN, 0.5, 0.5]),
        op(Opcode::Mov, temp(0), WriteMask::X, &[c(1)]),
        op(Opcode::Mov, temp(1), xyz(), &[c(1)]),
    ];
    let table = ConstantTable::default();
    let state = load(&table, &program);

    assert_eq!(state.source_name(&program[1], 0).unwrap(), "(1.0 / 0.0)");
    assert_eq!(
        state.source_name(&program[2], 0).unwrap(),
        "float3((1.0 / 0.0), (0.0 / 0.0), 0.5)"
    );
}

#[test]
fn vertex_outputs_without_dcl_are_qualified() {
    // vs_1_1 writes oPos/oD0/oT0 directly.
    let opos = reg(RegisterType::RastOut, 0);
    let od0 = reg(RegisterType::AttrOut, 0);
    let ot0 = reg(RegisterType::Output, 0);
    let v0 = reg(RegisterType::Input, 0);
    let program = vec![
        op(Opcode::Mov, opos, WriteMask::all(), &[v0]),
        op(Opcode::Mov, od0, WriteMask::all(), &[v0]),
        op(Opcode::Mov, ot0, xy(), &[v0]),
    ];
    let table = ConstantTable::default();
    let state = load(&table, &program);

    assert_eq!(state.destination_name(&program[0]).unwrap(), "o.position");
    assert_eq!(state.destination_name(&program[1]).unwrap(), "o.color");
    assert_eq!(state.destination_name(&program[2]).unwrap(), "o.texcoord.xy");
}

#[test]
fn missing_operands_are_reported() {
    let table = ConstantTable::default();
    let state = load(&table, &[]);
    let nop = Instruction::new(Opcode::Nop, vec![]);

    assert_eq!(
        state.destination_name(&nop),
        Err(DecompileError::MissingOperand {
            opcode: Opcode::Nop,
            what: "destination",
        })
    );
    assert_eq!(
        state.source_name(&nop, 0),
        Err(DecompileError::MissingOperand {
            opcode: Opcode::Nop,
            what: "source operand",
        })
    );
}

#[test]
fn resolution_is_repeatable() {
    let def = Instruction::def(c(0), [0.25, 0.5, 0.25, 0.25]);
    let inst = op(Opcode::Mad, temp(0), xyz(), &[temp(1), c(0), c(3)]);
    let table = ConstantTable::default();
    let state = load(&table, &[def, inst.clone()]);

    for n in 0..3 {
        assert_eq!(
            state.resolve_source(&inst, n).unwrap(),
            state.resolve_source(&inst, n).unwrap()
        );
    }
    assert_eq!(
        state.destination_name(&inst).unwrap(),
        state.destination_name(&inst).unwrap()
    );
}

/// ps_3_0:
///   dcl_texcoord v0.xy
///   dcl_color v1
///   dcl_2d s0
///   def c0, 0.5, 0.5, 0.5, 1
///   texld r0, v0, s0
///   mul r0.xyz, r0, v1
///   add r0.w, r0.w, -c0
///   mov oC0, r0
#[test]
fn renders_pixel_shader_body() {
    let v0 = reg(RegisterType::Input, 0);
    let v1 = reg(RegisterType::Input, 1);
    let s0 = reg(RegisterType::Sampler, 0);
    let oc0 = reg(RegisterType::ColorOut, 0);
    let program = vec![
        Instruction::dcl(DclUsage::TexCoord, 0, v0, xy()),
        Instruction::dcl(DclUsage::Color, 0, v1, WriteMask::all()),
        Instruction::dcl(
            DclUsage::TextureType(TextureType::Texture2D),
            0,
            s0,
            WriteMask::all(),
        ),
        Instruction::def(c(0), [0.5, 0.5, 0.5, 1.0]),
        op(Opcode::Tex, temp(0), WriteMask::all(), &[v0, s0]),
        op(Opcode::Mul, temp(0), xyz(), &[temp(0), v1]),
        Instruction::new(
            Opcode::Add,
            vec![
                Operand::dst(temp(0), WriteMask::W),
                Operand::src(temp(0)),
                Operand::src_with(c(0), Swizzle::identity(), SrcModifier::Negate),
            ],
        ),
        op(Opcode::Mov, oc0, WriteMask::all(), &[temp(0)]),
        Instruction::new(Opcode::End, vec![]),
    ];
    let table = ConstantTable::new(vec![ConstantDeclaration::sampler(
        "DiffuseSampler",
        ParameterType::Sampler2D,
        0,
    )]);
    let state = load(&table, &program);

    let mut lines = Vec::new();
    for inst in &program {
        if matches!(inst.opcode, Opcode::Dcl | Opcode::Def | Opcode::End) {
            continue;
        }
        let args = (0..inst.sources().count())
            .map(|n| state.source_name(inst, n))
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
            .join(", ");
        let dst = state.destination_name(inst).unwrap();
        lines.push(format!("{dst} = {}({args});", inst.opcode.name()));
    }

    insta::assert_snapshot!(lines.join("\n"), @r"
    r0 = texld(i.texcoord, DiffuseSampler);
    r0.xyz = mul(r0, i.color);
    r0.w = add(r0.w, -1);
    color = mov(r0);
    ");
}
